//! History listing and session reload commands.

use tracing::info;

use crate::history::{BlobStore, HistoryStore, Session, SessionSummary};

/// List stored sessions, newest first.
pub fn list_history_sessions<S: BlobStore>(history: &HistoryStore<S>) -> Vec<SessionSummary> {
    let sessions: Vec<SessionSummary> = history.load().iter().map(SessionSummary::from).collect();
    info!("Listed {} history sessions", sessions.len());
    sessions
}

/// Get a full session, records included, for reloading.
pub fn get_history_session<S: BlobStore>(
    history: &HistoryStore<S>,
    session_id: &str,
) -> Result<Session, String> {
    let session = history
        .get(session_id)
        .ok_or_else(|| format!("Session not found: {}", session_id))?;
    info!("Retrieved session {}", session_id);
    Ok(session)
}
