//! Age encryption of serialized store snapshots.
//!
//! The store key from the vault is used as an age passphrase (scrypt
//! recipient). Snapshots are whole-database images, so every write
//! re-encrypts the full store.

use std::io::{Read, Write};
use std::iter;

use age::secrecy::SecretString;

use crate::error::{Result, VitalsError};
use crate::key::EncryptionKey;

/// Encrypt a database snapshot with the store key.
pub fn encrypt(data: &[u8], key: &EncryptionKey) -> Result<Vec<u8>> {
    let encryptor =
        age::Encryptor::with_user_passphrase(SecretString::from(key.expose().to_string()));

    let mut encrypted = Vec::new();
    let mut writer = encryptor
        .wrap_output(&mut encrypted)
        .map_err(|e| VitalsError::Crypto(format!("Failed to create encryptor: {}", e)))?;

    writer
        .write_all(data)
        .map_err(|e| VitalsError::Crypto(format!("Encryption write failed: {}", e)))?;

    writer
        .finish()
        .map_err(|e| VitalsError::Crypto(format!("Encryption finish failed: {}", e)))?;

    Ok(encrypted)
}

/// Decrypt a database snapshot.
///
/// # Errors
///
/// Returns `VitalsError::IncorrectKey` when the key does not open the file,
/// and `VitalsError::Crypto` for corrupted or truncated data.
pub fn decrypt(encrypted_data: &[u8], key: &EncryptionKey) -> Result<Vec<u8>> {
    let decryptor = age::Decryptor::new(encrypted_data)
        .map_err(|e| VitalsError::Crypto(format!("Failed to create decryptor: {}", e)))?;

    let mut decrypted = Vec::new();

    let identity = age::scrypt::Identity::new(SecretString::from(key.expose().to_string()));
    let mut reader = decryptor
        .decrypt(iter::once(&identity as &dyn age::Identity))
        .map_err(|e| match e {
            age::DecryptError::NoMatchingKeys
            | age::DecryptError::DecryptionFailed
            | age::DecryptError::KeyDecryptionFailed => VitalsError::IncorrectKey,
            _ => VitalsError::Crypto(format!("Decryption failed: {}", e)),
        })?;

    reader
        .read_to_end(&mut decrypted)
        .map_err(|e| VitalsError::Crypto(format!("Failed to read decrypted data: {}", e)))?;

    Ok(decrypted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let key = EncryptionKey::generate().unwrap();
        let plaintext = b"SQLite format 3\0 heart_table resting 58";

        let encrypted = encrypt(plaintext, &key).unwrap();
        assert_ne!(encrypted.as_slice(), plaintext.as_slice());

        let decrypted = decrypt(&encrypted, &key).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_key_is_incorrect_key() {
        let key = EncryptionKey::generate().unwrap();
        let other = EncryptionKey::generate().unwrap();

        let encrypted = encrypt(b"snapshot", &key).unwrap();
        let result = decrypt(&encrypted, &other);
        assert!(matches!(result, Err(VitalsError::IncorrectKey)));
    }

    #[test]
    fn test_garbage_is_not_a_snapshot() {
        let key = EncryptionKey::generate().unwrap();
        let result = decrypt(b"definitely not age", &key);
        assert!(matches!(result, Err(VitalsError::Crypto(_))));
    }
}
