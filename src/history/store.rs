use chrono::{SecondsFormat, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::storage::BlobStore;
use super::types::Session;
use crate::equipment::{aggregate, EquipmentRecord};
use crate::error::EquipScopeError;

/// Key the session list is stored under.
pub const HISTORY_KEY: &str = "equip_history";

/// Sessions kept after each save; older ones are dropped.
pub const MAX_HISTORY_SESSIONS: usize = 5;

/// Most-recent-first list of past sessions over a blob store.
///
/// `save` is read-prepend-write with no locking. Two writers sharing one
/// blob store race and the last write wins.
pub struct HistoryStore<S: BlobStore> {
    storage: S,
}

impl<S: BlobStore> HistoryStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Current persisted sessions, newest first.
    ///
    /// A missing key, a storage failure, or a blob that is not a session
    /// list all come back as an empty history.
    pub fn load(&self) -> Vec<Session> {
        let bytes = match self.storage.load(HISTORY_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read history, treating as empty: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<Session>>(&bytes) {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(
                    "Stored history ({} bytes) is not a session list, treating as empty: {}",
                    bytes.len(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Look up one stored session by id.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.load().into_iter().find(|s| s.id == session_id)
    }

    /// Record a new session and return the updated, truncated history.
    ///
    /// Persistence failures are logged; the returned list still contains the
    /// new session so the caller can show it.
    pub fn save(&self, file_name: &str, records: Vec<EquipmentRecord>) -> Vec<Session> {
        let sessions = self.prepend(new_session(file_name, records));
        if let Err(e) = self.persist(&sessions) {
            error!("Failed to persist history after saving '{}': {}", file_name, e);
        }
        sessions
    }

    /// Like `save`, but reports persistence failures.
    pub fn try_save(
        &self,
        file_name: &str,
        records: Vec<EquipmentRecord>,
    ) -> Result<Vec<Session>, EquipScopeError> {
        let sessions = self.prepend(new_session(file_name, records));
        self.persist(&sessions)?;
        Ok(sessions)
    }

    fn prepend(&self, session: Session) -> Vec<Session> {
        let mut sessions = Vec::with_capacity(MAX_HISTORY_SESSIONS + 1);
        sessions.push(session);
        sessions.extend(self.load());
        sessions.truncate(MAX_HISTORY_SESSIONS);
        sessions
    }

    fn persist(&self, sessions: &[Session]) -> Result<(), EquipScopeError> {
        let json = serde_json::to_vec(sessions)
            .map_err(|e| EquipScopeError::Storage(format!("Failed to serialize history: {}", e)))?;
        self.storage.save(HISTORY_KEY, &json)?;

        if let Some(latest) = sessions.first() {
            info!(
                "Saved session {} for '{}' ({} records); history holds {} sessions",
                latest.id,
                latest.file_name,
                latest.records.len(),
                sessions.len()
            );
        }
        Ok(())
    }
}

fn new_session(file_name: &str, records: Vec<EquipmentRecord>) -> Session {
    Session {
        id: Uuid::new_v4().to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        file_name: file_name.to_string(),
        stats: aggregate(&records),
        records,
    }
}
