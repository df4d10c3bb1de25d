use serde::Serialize;
use tracing::info;

use crate::config::{config_path, resolve_api_key, AiProvider, Settings};
use crate::history::{HistoryStore, SqliteBlobStore};

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub provider: String,
    pub api_key_set: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub config_path: String,
    pub config_present: bool,
    pub active_provider: String,
    pub active_model: String,
    pub history_db_path: String,
    pub history_db_present: bool,
    pub history_db_accessible: bool,
    pub history_sessions: usize,
    pub providers: Vec<ProviderStatus>,
}

pub fn run_health_check(settings: &Settings) -> HealthReport {
    info!("Running health check");

    let config = config_path();
    let config_present = config.is_file();
    info!("Config file present: {} at {:?}", config_present, config);

    // Read-only: a health check must not create the database it reports on
    let db_path = settings.history_db_path();
    let db_present = db_path.is_file();
    let (accessible, sessions) = if db_present {
        match SqliteBlobStore::open_read_only(&db_path) {
            Ok(storage) => (true, HistoryStore::new(storage).load().len()),
            Err(e) => {
                info!("History database not accessible: {}", e);
                (false, 0)
            }
        }
    } else {
        (false, 0)
    };
    info!(
        "History database present: {}, accessible: {} ({} sessions)",
        db_present, accessible, sessions
    );

    let providers: Vec<ProviderStatus> = AiProvider::ALL
        .iter()
        .map(|p| ProviderStatus {
            provider: p.to_string(),
            api_key_set: resolve_api_key(*p).is_some(),
        })
        .collect();

    HealthReport {
        config_path: config.to_string_lossy().to_string(),
        config_present,
        active_provider: settings.provider().to_string(),
        active_model: settings.model(),
        history_db_path: db_path.to_string_lossy().to_string(),
        history_db_present: db_present,
        history_db_accessible: accessible,
        history_sessions: sessions,
        providers,
    }
}
