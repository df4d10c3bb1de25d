use serde::{Deserialize, Serialize};

use crate::equipment::{EquipmentRecord, SummaryStatistics};

/// One saved analysis: the uploaded file's records and their statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Random UUID assigned at save time
    pub id: String,
    /// RFC 3339 UTC generation time
    pub timestamp: String,
    pub file_name: String,
    pub stats: SummaryStatistics,
    #[serde(alias = "data")]
    pub records: Vec<EquipmentRecord>,
}

/// Compact view of a session for list displays.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub timestamp: String,
    pub file_name: String,
    pub total_count: usize,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            timestamp: session.timestamp.clone(),
            file_name: session.file_name.clone(),
            total_count: session.stats.total_count,
            avg_flowrate: session.stats.avg_flowrate,
            avg_pressure: session.stats.avg_pressure,
            avg_temperature: session.stats.avg_temperature,
        }
    }
}
