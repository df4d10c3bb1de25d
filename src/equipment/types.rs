use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row of an uploaded equipment CSV after normalization.
///
/// Numeric fields are always finite; missing or unparseable source values
/// are stored as `0.0`. Columns the parser does not recognize are kept in
/// `extra`, serialized as its own nested object so a passthrough column
/// named like a known field (`id`, `name`, ...) cannot collide with it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EquipmentRecord {
    /// Synthetic `item-<index>` id, unique within one parse only
    pub id: String,
    pub name: String,
    /// Free-form category label (Pump, Valve, ...)
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
    /// Passthrough columns, keyed by lowercased header
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// Aggregate metrics over a record set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatistics {
    pub total_count: usize,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    /// Record count per literal type label; counts sum to `total_count`
    pub type_distribution: BTreeMap<String, usize>,
}
