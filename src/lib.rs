pub mod commands;
pub mod config;
pub mod equipment;
mod error;
pub mod history;
pub mod insights;

pub use equipment::{aggregate, parse_csv, EquipmentRecord, SummaryStatistics};
pub use error::EquipScopeError;
pub use history::{HistoryStore, Session};
pub use insights::{request_insights, Insight, RiskLevel};

/// Install the stderr tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` picks the level
/// (0 = warn, 1 = info, 2+ = debug).
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
