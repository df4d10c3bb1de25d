use thiserror::Error;

#[derive(Debug, Error)]
pub enum EquipScopeError {
    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Input error: {0}")]
    Input(String),
}

impl From<EquipScopeError> for String {
    fn from(err: EquipScopeError) -> Self {
        err.to_string()
    }
}
