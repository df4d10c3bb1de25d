use std::collections::BTreeMap;

use super::types::{EquipmentRecord, SummaryStatistics};

/// Reduce a record set to summary statistics.
///
/// Averages are plain sums divided by the record count. An empty slice
/// yields all-zero statistics and an empty type distribution.
pub fn aggregate(records: &[EquipmentRecord]) -> SummaryStatistics {
    let count = records.len();
    if count == 0 {
        return SummaryStatistics::default();
    }

    let (flow, press, temp) = records.iter().fold((0.0, 0.0, 0.0), |acc, r| {
        (acc.0 + r.flowrate, acc.1 + r.pressure, acc.2 + r.temperature)
    });

    let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *distribution
            .entry(record.equipment_type.clone())
            .or_insert(0) += 1;
    }

    let n = count as f64;
    SummaryStatistics {
        total_count: count,
        avg_flowrate: flow / n,
        avg_pressure: press / n,
        avg_temperature: temp / n,
        type_distribution: distribution,
    }
}
