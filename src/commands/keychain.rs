use keyring::Entry;
use tracing::{info, warn};

use crate::config::{AiProvider, KEYCHAIN_USER};
use crate::error::EquipScopeError;

fn entry_for(provider: &str) -> Result<(AiProvider, Entry), String> {
    let provider: AiProvider = provider.parse()?;
    let entry = Entry::new(provider.keychain_service(), KEYCHAIN_USER).map_err(|e| {
        warn!("Failed to create keyring entry for {}: {}", provider, e);
        EquipScopeError::Keychain(e.to_string())
    })?;
    Ok((provider, entry))
}

pub fn set_api_key(provider: &str, key: &str) -> Result<(), String> {
    info!("Setting API key for provider: {}", provider);
    if key.trim().is_empty() {
        return Err(EquipScopeError::Keychain("API key must not be empty".to_string()).into());
    }
    let (provider, entry) = entry_for(provider)?;
    entry.set_password(key.trim()).map_err(|e| {
        warn!("Failed to set password for {}: {}", provider, e);
        EquipScopeError::Keychain(e.to_string()).into()
    })
}

pub fn get_api_key(provider: &str) -> Result<Option<String>, String> {
    info!("Getting API key for provider: {}", provider);
    let (provider, entry) = entry_for(provider)?;
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => {
            info!("No API key found for provider: {}", provider);
            Ok(None)
        }
        Err(e) => {
            warn!("Failed to get password for {}: {}", provider, e);
            Err(EquipScopeError::Keychain(e.to_string()).into())
        }
    }
}

pub fn delete_api_key(provider: &str) -> Result<(), String> {
    info!("Deleting API key for provider: {}", provider);
    let (provider, entry) = entry_for(provider)?;
    entry.delete_credential().map_err(|e| {
        warn!("Failed to delete credential for {}: {}", provider, e);
        EquipScopeError::Keychain(e.to_string()).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_rejected() {
        let err = get_api_key("kimi").unwrap_err();
        assert!(err.contains("Unknown AI provider"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = set_api_key("gemini", "   ").unwrap_err();
        assert!(err.contains("must not be empty"));
    }
}
