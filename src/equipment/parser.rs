//! Header-driven CSV parsing into `EquipmentRecord`s.
//!
//! The format is deliberately simple: comma separated, first non-blank line
//! is the header, no quoting. Parsing never fails; bad numeric cells become
//! `0.0` and short rows leave fields at their defaults.

use tracing::debug;

use super::types::EquipmentRecord;

/// Which record field a header column feeds.
#[derive(Debug, Clone, PartialEq)]
enum Column {
    Name,
    Type,
    Flowrate,
    Pressure,
    Temperature,
    Extra(String),
}

impl Column {
    fn from_header(header: &str) -> Self {
        match header {
            "equipment name" | "name" => Column::Name,
            "type" => Column::Type,
            "flowrate" => Column::Flowrate,
            "pressure" => Column::Pressure,
            "temperature" => Column::Temperature,
            other => Column::Extra(other.to_string()),
        }
    }
}

/// Builds a record from a default-valued start, one column at a time.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    record: EquipmentRecord,
}

impl RecordBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            record: EquipmentRecord {
                id: id.into(),
                ..Default::default()
            },
        }
    }

    /// Assign `value` to the field named by `header` (already lowercased).
    pub fn set(&mut self, header: &str, value: &str) -> &mut Self {
        self.assign(&Column::from_header(header), value);
        self
    }

    fn assign(&mut self, column: &Column, value: &str) {
        match column {
            Column::Name => self.record.name = value.to_string(),
            Column::Type => self.record.equipment_type = value.to_string(),
            Column::Flowrate => self.record.flowrate = parse_numeric(value),
            Column::Pressure => self.record.pressure = parse_numeric(value),
            Column::Temperature => self.record.temperature = parse_numeric(value),
            Column::Extra(key) => {
                self.record.extra.insert(key.clone(), value.to_string());
            }
        }
    }

    pub fn build(self) -> EquipmentRecord {
        self.record
    }
}

/// Parse delimited equipment text into records.
///
/// Blank lines are dropped before indexing, so ids run `item-0`, `item-1`, ...
/// over data rows only. Ids are not unique across separate calls.
pub fn parse_csv(text: &str) -> Vec<EquipmentRecord> {
    // Excel and friends prefix UTF-8 exports with a byte order mark
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split('\n').filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        debug!("CSV input has no header line");
        return Vec::new();
    };

    let columns: Vec<Column> = header_line
        .to_lowercase()
        .split(',')
        .map(|h| Column::from_header(h.trim()))
        .collect();

    let records: Vec<EquipmentRecord> = lines
        .enumerate()
        .map(|(idx, line)| {
            let mut builder = RecordBuilder::new(format!("item-{}", idx));
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            // Cells missing from a short row leave their field untouched
            for (column, value) in columns.iter().zip(values.iter()) {
                builder.assign(column, value);
            }
            builder.build()
        })
        .collect();

    debug!(
        "Parsed {} records from {} header columns",
        records.len(),
        columns.len()
    );
    records
}

/// Parse a numeric cell, falling back to its leading number, then to `0.0`.
///
/// `"12.5 bar"` yields `12.5`; `"N/A"`, `""`, `"NaN"` and `"inf"` yield `0.0`.
/// Overflowing literals such as `"1e999"` also yield `0.0` rather than
/// infinity: records are persisted as JSON, which has no non-finite numbers.
pub fn parse_numeric(value: &str) -> f64 {
    let value = value.trim();
    let parsed = value
        .parse::<f64>()
        .ok()
        .or_else(|| leading_number(value).and_then(|prefix| prefix.parse::<f64>().ok()));

    match parsed {
        Some(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Longest prefix of `value` shaped like `[+-]digits[.digits][e[+-]digits]`.
fn leading_number(value: &str) -> Option<&str> {
    let bytes = value.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts if it has digits of its own
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    Some(&value[..end])
}
