//! Typed CLI errors carrying an exit code and an optional hint.

use std::fmt;

use vitals_core::VitalsError;

use crate::constants::exit_codes;

#[derive(Debug)]
pub struct CliError {
    message: String,
    hint: Option<String>,
    exit_code: i32,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>, exit_code: i32) -> Self {
        Self {
            message: message.into(),
            hint,
            exit_code,
        }
    }

    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::new(message, Some(hint.into()), exit_codes::NOT_FOUND)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(message, None, exit_codes::INVALID_INPUT)
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::new(message, None, exit_codes::AUTH_FAILED)
    }

    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::new(message, Some(hint.into()), exit_codes::AUTH_FAILED)
    }

    pub fn integrity_failed(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::new(message, Some(hint.into()), exit_codes::INTEGRITY_FAILED)
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Print the error and hint to stderr and exit.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self.message);
        if let Some(hint) = &self.hint {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(self.exit_code)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

impl From<&VitalsError> for CliError {
    fn from(err: &VitalsError) -> Self {
        match err {
            VitalsError::InvalidCredentials => Self::auth_failed("Invalid credentials"),
            VitalsError::IncorrectKey => Self::auth_failed_with_hint(
                "The store cannot be decrypted with the key in the vault.",
                "Check the [vault] section of your config points at the vault used by `vitals init`.",
            ),
            VitalsError::InvalidKey(_) => Self::auth_failed_with_hint(
                err.to_string(),
                "The vault entry was modified outside vitals; restore it from a backup.",
            ),
            VitalsError::KeyStoreUnavailable(_) => Self::new(
                err.to_string(),
                Some("Set `backend = \"keyfile\"` under [vault] on hosts without a keychain.".to_string()),
                exit_codes::VAULT_UNAVAILABLE,
            ),
            VitalsError::NotFound(_) => Self::new(err.to_string(), None, exit_codes::NOT_FOUND),
            VitalsError::InvalidInput(_)
            | VitalsError::SeedRefused
            | VitalsError::ResetDisabled => Self::invalid_input(err.to_string()),
            _ => Self::new(err.to_string(), None, 1),
        }
    }
}

/// Exit code and message for any error that reached `main`.
pub fn classify(err: &anyhow::Error) -> CliError {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return CliError::new(cli.message.clone(), cli.hint.clone(), cli.exit_code);
    }
    if let Some(core) = err.downcast_ref::<VitalsError>() {
        return CliError::from(core);
    }
    CliError::new(format!("{:#}", err), None, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_message_is_generic() {
        let err = anyhow::Error::new(VitalsError::InvalidCredentials);
        let cli = classify(&err);
        assert_eq!(cli.to_string(), "Invalid credentials");
        assert_eq!(cli.exit_code(), exit_codes::AUTH_FAILED);
    }

    #[test]
    fn test_cli_errors_pass_through() {
        let err = anyhow::Error::new(CliError::not_found("No store", "Run vitals init"));
        let cli = classify(&err);
        assert_eq!(cli.exit_code(), exit_codes::NOT_FOUND);
        assert_eq!(cli.hint(), Some("Run vitals init"));
    }

    #[test]
    fn test_unknown_errors_are_general() {
        let cli = classify(&anyhow::anyhow!("boom"));
        assert_eq!(cli.exit_code(), 1);
    }
}
