use std::path::{Path, PathBuf};

use crate::error::{Result, VitalsError};
use crate::fs::write_atomic;

use super::SecretVault;

/// Vault that keeps each entry in its own owner-only file.
///
/// The key sits unencrypted on disk; anyone who can read the directory can
/// decrypt the store. Prefer [`super::KeychainVault`] where one exists.
#[derive(Debug, Clone)]
pub struct KeyfileVault {
    dir: PathBuf,
}

impl KeyfileVault {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(VitalsError::InvalidInput(format!(
                "Invalid vault entry name: {:?}",
                name
            )));
        }
        Ok(self.dir.join(format!("{}.key", name)))
    }
}

impl SecretVault for KeyfileVault {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let path = self.entry_path(name)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(VitalsError::KeyStoreUnavailable(format!(
                "Failed to read keyfile {}: {}",
                path.display(),
                err
            ))),
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        let path = self.entry_path(name)?;
        write_atomic(&path, value.as_bytes(), true).map_err(|e| {
            VitalsError::KeyStoreUnavailable(format!(
                "Failed to write keyfile {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn clear(&self, name: &str) -> Result<()> {
        let path = self.entry_path(name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(VitalsError::KeyStoreUnavailable(format!(
                "Failed to remove keyfile {}: {}",
                path.display(),
                err
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_keyfile_set_get_clear() {
        let dir = tempdir().unwrap();
        let vault = KeyfileVault::new(dir.path().join("vault"));

        assert_eq!(vault.get("db-encryption-key").unwrap(), None);
        vault.set("db-encryption-key", "first").unwrap();
        vault.set("db-encryption-key", "second").unwrap();
        assert_eq!(
            vault.get("db-encryption-key").unwrap().as_deref(),
            Some("second")
        );

        vault.clear("db-encryption-key").unwrap();
        vault.clear("db-encryption-key").unwrap();
        assert_eq!(vault.get("db-encryption-key").unwrap(), None);
    }

    #[test]
    fn test_keyfile_rejects_path_like_names() {
        let dir = tempdir().unwrap();
        let vault = KeyfileVault::new(dir.path());

        assert!(vault.set("../escape", "x").is_err());
        assert!(vault.get(".hidden").is_err());
        assert!(vault.get("").is_err());
    }
}
