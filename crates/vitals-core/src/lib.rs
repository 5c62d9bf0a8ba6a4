//! # Vitals Core
//!
//! Core library for Vitals - an encrypted, local-first personal health log.
//!
//! This crate owns the data layer independent of any interface: the
//! encrypted store, its key, the active-user session and the
//! session-scoped queries every screen or command goes through.
//!
//! ## Architecture
//!
//! - **vault**: secret storage backends for the store key
//! - **key**: key generation, retrieval and persistence
//! - **store**: the encrypted SQLite store and its worker thread
//! - **session**: the active user
//! - **query**: session-scoped statements and per-domain helpers
//!
//! ## Wiring
//!
//! ```no_run
//! use std::sync::Arc;
//! use vitals_core::{KeyManager, MemoryVault, Queries, SessionContext, StoreCell, StoreConfig};
//!
//! # async fn run() -> vitals_core::Result<()> {
//! let keys = KeyManager::new(Arc::new(MemoryVault::new()));
//! let store = Arc::new(StoreCell::new(StoreConfig::in_memory()));
//! store.initialize(&keys)?;
//!
//! let queries = Queries::new(store, Arc::new(SessionContext::new()));
//! queries.register_user("user1", "pass1").await?;
//! queries.login("user1", "pass1").await?;
//! queries.insert_goal_calories(2000).await?;
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod error;
pub mod fs;
pub mod key;
pub mod query;
pub mod session;
pub mod store;
pub mod vault;

pub use error::{Result, VitalsError};
pub use key::{EncryptionKey, KeyManager};
pub use query::{HeartReadings, MedicalRecord, Medication, NewActivity, Queries};
pub use session::{SessionContext, UserId};
pub use store::{
    Pending, QueryOutcome, ResetGuard, ScopedStatement, SeedMode, StoreCell, StoreConfig,
    StoreHandle, StoreLocation, TableName,
};
pub use vault::{KeychainVault, KeyfileVault, MemoryVault, SecretVault};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
