//! Path resolution for the store file.

use std::path::{Path, PathBuf};

use vitals_core::StoreLocation;

use crate::cli::Cli;
use crate::config::{VaultBackend, VitalsConfig};

/// Where the store lives: `--store`/`VITALS_STORE`, then config, then the
/// XDG default. A memory vault always gets a memory store, since its key
/// is gone when the process exits.
pub fn resolve_store_location(cli: &Cli, config: &VitalsConfig) -> anyhow::Result<StoreLocation> {
    if config.vault.backend == VaultBackend::Memory {
        return Ok(StoreLocation::Memory);
    }
    if let Some(path) = cli.store.as_deref() {
        if !path.trim().is_empty() {
            return Ok(StoreLocation::File(PathBuf::from(path)));
        }
    }
    Ok(StoreLocation::File(config.store_path()?))
}

/// Hint shown when the store file is missing.
pub fn missing_store_message(path: &Path) -> String {
    format!(
        "Run `vitals init` to create {}, or set VITALS_STORE to an existing store.",
        path.display()
    )
}
