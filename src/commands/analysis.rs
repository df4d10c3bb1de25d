//! Upload, sample-load and insight commands.

use std::path::Path;

use tracing::{error, info};

use crate::config::{resolve_api_key, Settings};
use crate::equipment::sample::{SAMPLE_CSV, SAMPLE_FILE_NAME};
use crate::equipment::{parse_csv, EquipmentRecord};
use crate::error::EquipScopeError;
use crate::history::{BlobStore, HistoryStore, Session, SqliteBlobStore};
use crate::insights::{request_insights, HttpTransport, Insight, InsightRequester};

/// Open the on-disk history configured in `settings`.
pub fn open_history(settings: &Settings) -> Result<HistoryStore<SqliteBlobStore>, String> {
    let db_path = settings.history_db_path();
    let storage = SqliteBlobStore::new(&db_path)
        .map_err(|e| format!("Failed to open history: {}", e))?;
    Ok(HistoryStore::new(storage))
}

/// Parse an equipment CSV file and record it as a new session.
///
/// Returns the session just created; it is also first in the stored history.
pub fn upload_csv<S: BlobStore>(history: &HistoryStore<S>, path: &Path) -> Result<Session, String> {
    let bytes = std::fs::read(path).map_err(|e| {
        EquipScopeError::Input(format!("Failed to read {:?}: {}", path, e))
    })?;
    // Invalid UTF-8 becomes U+FFFD; the parser degrades from there
    let text = String::from_utf8_lossy(&bytes);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    let records = parse_csv(&text);
    info!("Parsed {} records from '{}'", records.len(), file_name);
    latest_session(history.save(&file_name, records))
}

/// Record the built-in sample dataset as a new session.
pub fn load_sample<S: BlobStore>(history: &HistoryStore<S>) -> Result<Session, String> {
    let records = parse_csv(SAMPLE_CSV);
    info!("Loaded {} sample records", records.len());
    latest_session(history.save(SAMPLE_FILE_NAME, records))
}

fn latest_session(sessions: Vec<Session>) -> Result<Session, String> {
    sessions
        .into_iter()
        .next()
        .ok_or_else(|| EquipScopeError::Storage("History save returned no sessions".to_string()).into())
}

/// Request insights from the configured provider. Never fails; an
/// unavailable service yields an empty list.
pub async fn generate_insights(settings: &Settings, records: &[EquipmentRecord]) -> Vec<Insight> {
    let provider = settings.provider();
    let transport = match HttpTransport::new(settings.request_timeout_secs) {
        Ok(transport) => transport,
        Err(e) => {
            error!("{}", e);
            return Vec::new();
        }
    };

    let requester = InsightRequester::new(
        transport,
        provider,
        settings.model(),
        resolve_api_key(provider),
    );
    request_insights(&requester, records).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryBlobStore;
    use tempfile::TempDir;

    #[test]
    fn test_upload_csv_records_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unit_7.csv");
        std::fs::write(&path, "Name,Type,Flowrate\nP1,Pump,10\nP2,Pump,N/A\n").unwrap();

        let history = HistoryStore::new(MemoryBlobStore::new());
        let session = upload_csv(&history, &path).unwrap();

        assert_eq!(session.file_name, "unit_7.csv");
        assert_eq!(session.records.len(), 2);
        assert_eq!(session.stats.avg_flowrate, 5.0);
        assert_eq!(history.load()[0].id, session.id);
    }

    #[test]
    fn test_upload_non_utf8_file_degrades() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.csv");
        // BOM, then a Latin-1 'é' (0xE9) that is not valid UTF-8
        let mut bytes = b"\xEF\xBB\xBFName,Type,Flowrate\nCaf".to_vec();
        bytes.extend_from_slice(b"\xE9 Pump,Pump,7.5\n");
        std::fs::write(&path, bytes).unwrap();

        let history = HistoryStore::new(MemoryBlobStore::new());
        let session = upload_csv(&history, &path).unwrap();

        assert_eq!(session.records.len(), 1);
        assert_eq!(session.records[0].name, "Caf\u{fffd} Pump");
        assert_eq!(session.records[0].equipment_type, "Pump");
        assert_eq!(session.records[0].flowrate, 7.5);
    }

    #[test]
    fn test_upload_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let history = HistoryStore::new(MemoryBlobStore::new());
        let err = upload_csv(&history, &dir.path().join("nope.csv")).unwrap_err();
        assert!(err.contains("Input error"));
        assert!(history.load().is_empty());
    }

    #[test]
    fn test_load_sample_uses_sample_file_name() {
        let history = HistoryStore::new(MemoryBlobStore::new());
        let session = load_sample(&history).unwrap();
        assert_eq!(session.file_name, SAMPLE_FILE_NAME);
        assert_eq!(session.stats.total_count, 10);
    }

    #[test]
    fn test_open_history_uses_configured_path() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("data").join("history.db");
        let mut settings = Settings::default();
        settings.set("history_db", &db.to_string_lossy()).unwrap();

        let history = open_history(&settings).unwrap();
        load_sample(&history).unwrap();
        assert!(db.exists());
    }

    #[tokio::test]
    async fn test_generate_insights_empty_records() {
        let insights = generate_insights(&Settings::default(), &[]).await;
        assert!(insights.is_empty());
    }
}
