use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, VitalsError};

use super::SecretVault;

/// In-process vault. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryVault {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| VitalsError::KeyStoreUnavailable("Memory vault poisoned".to_string()))
    }
}

impl SecretVault for MemoryVault {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.lock()?.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, name: &str) -> Result<()> {
        self.lock()?.remove(name);
        Ok(())
    }
}
