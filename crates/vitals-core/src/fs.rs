//! Filesystem utilities for atomic writes.

use std::fs;
use std::fs::{File, OpenOptions};
use std::io;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, VitalsError};

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        // Best-effort replace on platforms where rename fails if target exists.
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

/// Write `data` to `path` through a synced temp file in the same directory.
///
/// With `owner_only` set, the temp file is restricted to mode `0600` before
/// it is renamed into place (no-op on non-Unix platforms).
pub fn write_atomic(path: &Path, data: &[u8], owner_only: bool) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| {
        VitalsError::Storage(format!(
            "Failed to create directory {}: {}",
            parent.display(),
            e
        ))
    })?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| VitalsError::Storage(format!("System time error: {}", e)))?
        .as_nanos();
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| VitalsError::Storage("Invalid file name".to_string()))?;
    let temp_path = parent.join(format!(".{}.{}.tmp", filename, nanos));

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| VitalsError::Storage(format!("Temp file create failed: {}", e)))?;
    fill_temp(&temp_path, file, data, owner_only)?;

    rename_with_fallback(&temp_path, path)
        .map_err(|e| VitalsError::Storage(format!("Atomic rename failed: {}", e)))?;

    Ok(())
}

/// Write and sync `data` into the freshly created temp file.
///
/// On failure the temp file is removed before the error is returned.
fn fill_temp(temp_path: &Path, mut file: File, data: &[u8], owner_only: bool) -> Result<()> {
    let filled = (|| -> Result<()> {
        if owner_only {
            set_owner_only(temp_path)?;
        }
        file.write_all(data)
            .map_err(|e| VitalsError::Storage(format!("Temp file write failed: {}", e)))?;
        file.sync_all()
            .map_err(|e| VitalsError::Storage(format!("Temp file sync failed: {}", e)))?;
        Ok(())
    })();
    drop(file);

    if filled.is_err() {
        let _ = fs::remove_file(temp_path);
    }
    filled
}

fn set_owner_only(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rename_overwrites_existing() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("temp.txt");
        let dest = dir.path().join("dest.txt");

        File::create(&dest).unwrap().write_all(b"old").unwrap();
        File::create(&temp).unwrap().write_all(b"new").unwrap();

        rename_with_fallback(&temp, &dest).unwrap();

        assert!(!temp.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_write_atomic_creates_parent_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("nested").join("store.age");

        write_atomic(&dest, b"payload", false).unwrap();
        write_atomic(&dest, b"payload-2", false).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"payload-2");
        let leftovers: Vec<_> = fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_failed_temp_write_removes_temp_file() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join(".store.age.1.tmp");
        File::create(&temp).unwrap();

        // Opened read-only, so the write fails.
        let readonly = File::open(&temp).unwrap();
        let err = fill_temp(&temp, readonly, b"payload", false).unwrap_err();

        assert!(matches!(err, VitalsError::Storage(_)));
        assert!(!temp.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("secret.key");
        write_atomic(&dest, b"k", true).unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
