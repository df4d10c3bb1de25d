//! Bounded, most-recent-first history of analysis sessions.

pub mod storage;
pub mod store;
pub mod types;

pub use storage::{BlobStore, MemoryBlobStore, SqliteBlobStore};
pub use store::{HistoryStore, HISTORY_KEY, MAX_HISTORY_SESSIONS};
pub use types::{Session, SessionSummary};
