//! Error types for Vitals core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages and exit codes.

use thiserror::Error;

/// Result type alias for Vitals operations.
pub type Result<T> = std::result::Result<T, VitalsError>;

/// Core error type for Vitals operations.
#[derive(Debug, Error)]
pub enum VitalsError {
    /// The secure vault could not be read or written
    #[error("Key store unavailable: {0}")]
    KeyStoreUnavailable(String),

    /// The vault holds a value that is not a well-formed store key
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    /// The store file cannot be decrypted with the key from the vault
    #[error("Store cannot be decrypted with the vault key")]
    IncorrectKey,

    /// A data operation ran before the store was initialized
    #[error("Store is not initialized")]
    StoreNotInitialized,

    /// A session-scoped operation ran with nobody logged in
    #[error("No active session")]
    NoActiveSession,

    /// SQLite rejected a statement
    #[error("Statement failed: {source}")]
    Statement {
        #[from]
        source: rusqlite::Error,
    },

    /// A batch was rolled back because one of its statements failed
    #[error("Batch aborted at statement {index}: {source}")]
    BatchAborted {
        index: usize,
        #[source]
        source: Box<VitalsError>,
    },

    /// A scoped statement does not reference the `:user_id` parameter
    #[error("Statement is not session-scoped (missing :user_id)")]
    UnscopedStatement,

    /// Positional parameters supplied do not match the statement
    #[error("Statement expects {expected} positional parameters, got {supplied}")]
    ParameterMismatch { expected: usize, supplied: usize },

    /// Login failed
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Sample data refused because the store already holds users
    #[error("Store already contains users; seeding requires an explicit opt-in")]
    SeedRefused,

    /// Destructive reset requested without enabling it in configuration
    #[error("Destructive reset is disabled")]
    ResetDisabled,

    /// The store worker thread has stopped
    #[error("Store worker stopped")]
    WorkerStopped,

    /// Encryption or decryption error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl VitalsError {
    /// Errors after which the store can never be opened with the current key.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VitalsError::IncorrectKey
                | VitalsError::InvalidKey(_)
                | VitalsError::KeyStoreUnavailable(_)
        )
    }
}
