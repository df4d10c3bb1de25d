//! Equipment CSV ingestion and summary statistics.

pub mod parser;
pub mod sample;
pub mod stats;
pub mod types;

pub use parser::{parse_csv, RecordBuilder};
pub use stats::aggregate;
pub use types::*;
