use crate::error::{Result, VitalsError};

use super::SecretVault;

/// Vault backed by the OS keychain (Keychain, Secret Service, Credential Manager).
#[derive(Debug, Clone)]
pub struct KeychainVault {
    service: String,
}

impl KeychainVault {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, name: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, name)
            .map_err(|e| VitalsError::KeyStoreUnavailable(format!("Keychain entry failed: {}", e)))
    }
}

impl SecretVault for KeychainVault {
    fn get(&self, name: &str) -> Result<Option<String>> {
        match self.entry(name)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(VitalsError::KeyStoreUnavailable(format!(
                "Keychain read failed: {}",
                err
            ))),
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.entry(name)?
            .set_password(value)
            .map_err(|e| VitalsError::KeyStoreUnavailable(format!("Keychain write failed: {}", e)))
    }

    fn clear(&self, name: &str) -> Result<()> {
        match self.entry(name)?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(VitalsError::KeyStoreUnavailable(format!(
                "Keychain delete failed: {}",
                err
            ))),
        }
    }
}
