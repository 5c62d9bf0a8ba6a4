use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{env, DEFAULT_KEYCHAIN_SERVICE};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VitalsConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub vault: VaultSection,
    #[serde(default)]
    pub dev: DevSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSection {
    #[serde(default)]
    pub backend: VaultBackend,
    #[serde(default = "default_service")]
    pub service: String,
    /// Vault entry holding the store key.
    pub account: Option<String>,
    pub keyfile_path: Option<String>,
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            backend: VaultBackend::default(),
            service: default_service(),
            account: None,
            keyfile_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevSection {
    #[serde(default)]
    pub allow_seed_existing: bool,
    #[serde(default)]
    pub allow_reset: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VaultBackend {
    /// Platform credential store.
    #[default]
    Keychain,
    /// Owner-only key file, for hosts without a keychain.
    Keyfile,
    /// Process memory; the store is ephemeral too.
    Memory,
}

fn default_service() -> String {
    DEFAULT_KEYCHAIN_SERVICE.to_string()
}

impl VitalsConfig {
    pub fn new(store_path: PathBuf, backend: VaultBackend, keyfile_path: Option<PathBuf>) -> Self {
        Self {
            store: StoreSection {
                path: Some(store_path.to_string_lossy().to_string()),
            },
            vault: VaultSection {
                backend,
                keyfile_path: keyfile_path.map(|path| path.to_string_lossy().to_string()),
                ..VaultSection::default()
            },
            dev: DevSection::default(),
        }
    }

    /// Store path from config, or the XDG default.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        match &self.store.path {
            Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
            _ => default_store_path(),
        }
    }

    pub fn keyfile_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.vault.keyfile_path {
            Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
            _ => default_keyfile_dir(),
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("vitals.db.age"))
}

pub fn default_keyfile_dir() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("keys"))
}

/// Config file path, `VITALS_CONFIG` first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(env::CONFIG) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// The config at `path`, or defaults when the file does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<VitalsConfig> {
    if !path.exists() {
        return Ok(VitalsConfig::default());
    }
    read_config(path)
}

pub fn read_config(path: &Path) -> anyhow::Result<VitalsConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &VitalsConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("vitals"));
        }
    }
    Ok(home_dir()?.join(".config").join("vitals"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("vitals"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("vitals"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
