//! Store encryption key lifecycle.
//!
//! One key exists per installation. It is minted on first run, written to
//! the vault, and recovered from the vault on every later run. Losing it
//! makes the store permanently unreadable; there is no recovery path.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::error::{Result, VitalsError};
use crate::vault::SecretVault;

/// Number of characters in a store key.
pub const KEY_LENGTH: usize = 32;

/// The 94 printable non-space ASCII symbols a key is drawn from.
pub const KEY_ALPHABET: &[u8] =
    b"!\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Vault entry name used when none is configured.
pub const DEFAULT_KEY_ENTRY: &str = "db-encryption-key";

/// Largest multiple of the alphabet size that fits in a byte; bytes at or
/// above it are rejected so every symbol is equally likely.
const SAMPLE_LIMIT: u8 = (256 / KEY_ALPHABET.len() * KEY_ALPHABET.len()) as u8;

/// The symmetric key protecting the store.
///
/// Key material is zeroized when dropped and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    value: Zeroizing<String>,
}

impl EncryptionKey {
    /// Mint a fresh key from OS randomness.
    pub fn generate() -> Result<Self> {
        let mut value = Zeroizing::new(String::with_capacity(KEY_LENGTH));
        let mut pool = Zeroizing::new([0u8; 64]);

        while value.len() < KEY_LENGTH {
            getrandom::getrandom(&mut pool[..])
                .map_err(|e| VitalsError::Crypto(format!("Failed to gather randomness: {}", e)))?;
            for &byte in pool.iter() {
                if byte >= SAMPLE_LIMIT {
                    continue;
                }
                value.push(KEY_ALPHABET[(byte as usize) % KEY_ALPHABET.len()] as char);
                if value.len() == KEY_LENGTH {
                    break;
                }
            }
        }

        Ok(Self { value })
    }

    /// Validate a key read back from a vault.
    ///
    /// A trailing line break (hand-edited keyfiles) is ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim_end_matches(['\r', '\n']);
        if trimmed.len() != KEY_LENGTH {
            return Err(VitalsError::InvalidKey(format!(
                "expected {} characters, found {}",
                KEY_LENGTH,
                trimmed.chars().count()
            )));
        }
        if !trimmed.bytes().all(|b| KEY_ALPHABET.contains(&b)) {
            return Err(VitalsError::InvalidKey(
                "key contains characters outside the key alphabet".to_string(),
            ));
        }
        Ok(Self {
            value: Zeroizing::new(trimmed.to_string()),
        })
    }

    /// The key as a passphrase for store encryption.
    ///
    /// Avoid storing or logging this value.
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Retrieves the installation key from a vault, creating it on first use.
pub struct KeyManager {
    vault: Arc<dyn SecretVault>,
    entry: String,
    cached: Mutex<Option<EncryptionKey>>,
}

impl KeyManager {
    pub fn new(vault: Arc<dyn SecretVault>) -> Self {
        Self::with_entry(vault, DEFAULT_KEY_ENTRY)
    }

    pub fn with_entry(vault: Arc<dyn SecretVault>, entry: impl Into<String>) -> Self {
        Self {
            vault,
            entry: entry.into(),
            cached: Mutex::new(None),
        }
    }

    /// Return the installation key, minting and persisting one if the vault is empty.
    ///
    /// Repeated calls return the same key, within a process through the
    /// cache and across processes through the vault.
    pub fn retrieve_or_create_key(&self) -> Result<EncryptionKey> {
        let mut cached = self.lock_cache()?;
        if let Some(key) = cached.as_ref() {
            return Ok(key.clone());
        }

        let key = match self.vault.get(&self.entry)? {
            Some(raw) => {
                debug!(entry = %self.entry, "recovered store key from vault");
                EncryptionKey::parse(&raw)?
            }
            None => {
                let key = EncryptionKey::generate()?;
                self.vault.set(&self.entry, key.expose())?;
                info!(entry = %self.entry, "minted new store key");
                key
            }
        };

        *cached = Some(key.clone());
        Ok(key)
    }

    /// Overwrite the vault entry with `key`.
    ///
    /// This does not re-encrypt an existing store; writing a different key
    /// over one that protects live data makes that data unreadable.
    pub fn persist_key(&self, key: &EncryptionKey) -> Result<()> {
        let mut cached = self.lock_cache()?;
        self.vault.set(&self.entry, key.expose())?;
        *cached = Some(key.clone());
        Ok(())
    }

    /// Remove the key from the vault and forget the cached copy.
    pub fn clear_key(&self) -> Result<()> {
        let mut cached = self.lock_cache()?;
        self.vault.clear(&self.entry)?;
        *cached = None;
        Ok(())
    }

    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, Option<EncryptionKey>>> {
        self.cached
            .lock()
            .map_err(|_| VitalsError::KeyStoreUnavailable("Key cache poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::vault::MemoryVault;

    struct LockedVault;

    impl SecretVault for LockedVault {
        fn get(&self, _name: &str) -> Result<Option<String>> {
            Err(VitalsError::KeyStoreUnavailable("vault locked".to_string()))
        }

        fn set(&self, _name: &str, _value: &str) -> Result<()> {
            Err(VitalsError::KeyStoreUnavailable("vault locked".to_string()))
        }

        fn clear(&self, _name: &str) -> Result<()> {
            Err(VitalsError::KeyStoreUnavailable("vault locked".to_string()))
        }
    }

    #[test]
    fn test_alphabet_is_94_distinct_printable_symbols() {
        assert_eq!(KEY_ALPHABET.len(), 94);
        let distinct: HashSet<u8> = KEY_ALPHABET.iter().copied().collect();
        assert_eq!(distinct.len(), 94);
        assert!(KEY_ALPHABET.iter().all(|b| b.is_ascii_graphic()));
    }

    #[test]
    fn test_generated_keys_are_distinct_and_well_formed() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let key = EncryptionKey::generate().unwrap();
            assert_eq!(key.expose().len(), KEY_LENGTH);
            assert!(key.expose().bytes().all(|b| KEY_ALPHABET.contains(&b)));
            assert!(seen.insert(key.expose().to_string()));
        }
    }

    #[test]
    fn test_key_idempotent_across_restarts() {
        let vault = MemoryVault::new();

        let first_run = KeyManager::new(Arc::new(vault.clone()));
        let first = first_run.retrieve_or_create_key().unwrap();
        assert_eq!(first, first_run.retrieve_or_create_key().unwrap());

        let second_run = KeyManager::new(Arc::new(vault.clone()));
        let second = second_run.retrieve_or_create_key().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            vault.get(DEFAULT_KEY_ENTRY).unwrap().as_deref(),
            Some(first.expose())
        );
    }

    #[test]
    fn test_vault_unavailable_is_reported() {
        let manager = KeyManager::new(Arc::new(LockedVault));
        let err = manager.retrieve_or_create_key().unwrap_err();
        assert!(matches!(err, VitalsError::KeyStoreUnavailable(_)));
    }

    #[test]
    fn test_malformed_vault_value_is_not_replaced() {
        let vault = MemoryVault::new();
        vault.set(DEFAULT_KEY_ENTRY, "too-short").unwrap();

        let manager = KeyManager::new(Arc::new(vault.clone()));
        let err = manager.retrieve_or_create_key().unwrap_err();
        assert!(matches!(err, VitalsError::InvalidKey(_)));
        assert_eq!(
            vault.get(DEFAULT_KEY_ENTRY).unwrap().as_deref(),
            Some("too-short")
        );
    }

    #[test]
    fn test_persist_key_overwrites_vault_and_cache() {
        let vault = MemoryVault::new();
        let manager = KeyManager::new(Arc::new(vault.clone()));
        let original = manager.retrieve_or_create_key().unwrap();

        let replacement = EncryptionKey::generate().unwrap();
        manager.persist_key(&replacement).unwrap();

        assert_ne!(original, replacement);
        assert_eq!(manager.retrieve_or_create_key().unwrap(), replacement);
        assert_eq!(
            vault.get(DEFAULT_KEY_ENTRY).unwrap().as_deref(),
            Some(replacement.expose())
        );
    }

    #[test]
    fn test_parse_accepts_trailing_newline() {
        let key = EncryptionKey::generate().unwrap();
        let parsed = EncryptionKey::parse(&format!("{}\n", key.expose())).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = EncryptionKey::generate().unwrap();
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains(key.expose()));
    }
}
