//! Password hashing for `user_table`.
//!
//! Passwords are stored as Argon2id PHC strings, never as given.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::{Result, VitalsError};

const SALT_LENGTH: usize = 16;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| VitalsError::Crypto(format!("Failed to generate salt: {}", e)))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| VitalsError::Crypto(format!("Failed to encode salt: {}", e)))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| VitalsError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Check `password` against a stored PHC string.
///
/// A mismatch is `Ok(false)`; an unparseable hash is an error.
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| VitalsError::Crypto(format!("Stored password hash is invalid: {}", e)))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(VitalsError::Crypto(format!(
            "Password verification failed: {}",
            err
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("pass1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("pass1"));
        assert!(verify_password("pass1", &hash).unwrap());
        assert!(!verify_password("pass2", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salts() {
        assert_ne!(hash_password("pass1").unwrap(), hash_password("pass1").unwrap());
    }

    #[test]
    fn test_plaintext_in_store_is_an_error() {
        assert!(verify_password("pass1", "pass1").is_err());
    }
}
