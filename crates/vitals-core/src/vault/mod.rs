//! Secure vault backends for the store encryption key.
//!
//! The vault is the only place the store key is ever written. All
//! backends implement [`SecretVault`], a small name/value interface:
//!
//! - [`KeychainVault`]: the platform credential store (via `keyring`)
//! - [`KeyfileVault`]: owner-only files in a directory, for headless hosts
//! - [`MemoryVault`]: process memory, for tests and throwaway stores
//!
//! Backend failures surface as `VitalsError::KeyStoreUnavailable`.

mod keychain;
mod keyfile;
mod memory;

pub use keychain::KeychainVault;
pub use keyfile::KeyfileVault;
pub use memory::MemoryVault;

use crate::error::Result;

/// Opaque credential storage.
pub trait SecretVault: Send + Sync {
    /// Read a value, `Ok(None)` when the entry does not exist.
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Write a value, replacing any existing one.
    fn set(&self, name: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing entry is not an error.
    fn clear(&self, name: &str) -> Result<()>;
}
