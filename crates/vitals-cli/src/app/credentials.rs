//! Username and password input.

use dialoguer::{Input, Password};
use zeroize::Zeroizing;

use crate::constants::env;

/// Username from `--user`/`VITALS_USER`, or a prompt.
pub fn prompt_username(given: Option<&str>, interactive: bool) -> anyhow::Result<String> {
    if let Some(value) = given {
        if !value.trim().is_empty() {
            return Ok(value.trim().to_string());
        }
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No username provided and no TTY available. Pass --user or set {}.",
            env::USER
        ));
    }
    Input::<String>::new()
        .with_prompt("Username")
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to read username: {}", e))
}

/// Password from `VITALS_PASSWORD`, or a prompt.
pub fn prompt_password(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = password_from_env() {
        return Ok(value);
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No password provided and no TTY available. Set {}.",
            env::PASSWORD
        ));
    }
    Password::new()
        .with_prompt("Password")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Password with confirmation (for `register`), or `VITALS_PASSWORD`.
pub fn prompt_new_password(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = password_from_env() {
        return Ok(value);
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No password provided and no TTY available. Set {}.",
            env::PASSWORD
        ));
    }
    Password::new()
        .with_prompt("Choose a password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

fn password_from_env() -> Option<Zeroizing<String>> {
    let value = Zeroizing::new(std::env::var(env::PASSWORD).ok()?);
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
