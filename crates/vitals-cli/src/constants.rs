//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config, store, medication).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong credentials, wrong store key).
    pub const AUTH_FAILED: i32 = 5;

    /// Integrity check failed.
    pub const INTEGRITY_FAILED: i32 = 6;

    /// The key vault could not be reached.
    pub const VAULT_UNAVAILABLE: i32 = 7;
}

/// Environment variables the CLI reads.
pub mod env {
    pub const CONFIG: &str = "VITALS_CONFIG";
    pub const STORE: &str = "VITALS_STORE";
    pub const USER: &str = "VITALS_USER";
    pub const PASSWORD: &str = "VITALS_PASSWORD";
    pub const LOG: &str = "VITALS_LOG";
}

/// Keychain service name used when the config does not set one.
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "vitals";

/// Log filter used when `VITALS_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";
