//! Application context for the Vitals CLI.
//!
//! Bundles CLI arguments with the lazily-loaded config and acts as the
//! composition root: it builds the vault, key manager, store cell and
//! session that the core expects to be handed in.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tracing::{debug, warn};

use vitals_core::{
    KeyManager, KeychainVault, KeyfileVault, MemoryVault, Queries, SecretVault, SessionContext,
    StoreCell, StoreConfig, StoreLocation, UserId,
};

use crate::cli::Cli;
use crate::config::{load_config, resolve_config_path, VaultBackend, VitalsConfig};
use crate::errors::CliError;

use super::credentials::{prompt_password, prompt_username};
use super::resolver::{missing_store_message, resolve_store_location};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config_path: OnceCell<PathBuf>,
    config: OnceCell<VitalsConfig>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config_path: OnceCell::new(),
            config: OnceCell::new(),
        }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    pub fn json(&self) -> bool {
        self.cli.json
    }

    /// Prompts are allowed only on a terminal and without `--no-input`.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal() && !self.cli.no_input
    }

    pub fn config_path(&self) -> anyhow::Result<&PathBuf> {
        self.config_path.get_or_try_init(resolve_config_path)
    }

    /// The config file, or defaults when there is none yet.
    pub fn config(&self) -> anyhow::Result<&VitalsConfig> {
        self.config
            .get_or_try_init(|| load_config(self.config_path()?))
    }

    pub fn store_location(&self) -> anyhow::Result<StoreLocation> {
        resolve_store_location(self.cli, self.config()?)
    }

    pub fn store_config(&self) -> anyhow::Result<StoreConfig> {
        Ok(StoreConfig {
            location: self.store_location()?,
            allow_reset: self.config()?.dev.allow_reset,
        })
    }

    pub fn vault(&self) -> anyhow::Result<Arc<dyn SecretVault>> {
        let config = self.config()?;
        let vault: Arc<dyn SecretVault> = match config.vault.backend {
            VaultBackend::Keychain => Arc::new(KeychainVault::new(config.vault.service.clone())),
            VaultBackend::Keyfile => Arc::new(KeyfileVault::new(config.keyfile_dir()?)),
            VaultBackend::Memory => Arc::new(MemoryVault::new()),
        };
        Ok(vault)
    }

    pub fn key_manager(&self) -> anyhow::Result<KeyManager> {
        let vault = self.vault()?;
        Ok(match self.config()?.vault.account.as_deref() {
            Some(entry) if !entry.trim().is_empty() => KeyManager::with_entry(vault, entry),
            _ => KeyManager::new(vault),
        })
    }

    /// Initialize the store, creating it if it does not exist yet.
    pub fn open_or_create(&self) -> anyhow::Result<Queries> {
        let keys = self.key_manager()?;
        let cell = Arc::new(StoreCell::new(self.store_config()?));
        cell.initialize(&keys)?;
        debug!("store initialized");
        Ok(Queries::new(cell, Arc::new(SessionContext::new())))
    }

    /// Initialize an existing store; a missing file is an error.
    pub fn open(&self) -> anyhow::Result<Queries> {
        if let StoreLocation::File(path) = self.store_location()? {
            if !path.exists() {
                return Err(CliError::not_found(
                    format!("No store found at {}", path.display()),
                    missing_store_message(&path),
                )
                .into());
            }
        }
        self.open_or_create()
    }

    /// Open the store and log in with `--user` and `VITALS_PASSWORD`,
    /// prompting for whatever is missing.
    pub async fn open_session(&self) -> anyhow::Result<(Queries, UserId)> {
        let queries = self.open()?;
        let interactive = self.interactive();
        let username = prompt_username(self.cli.user.as_deref(), interactive)?;
        let password = prompt_password(interactive)?;
        match queries.login(&username, &password).await {
            Ok(user) => Ok((queries, user)),
            Err(err) => {
                report_close_failure(self.finish(&queries).await);
                Err(err.into())
            }
        }
    }

    /// Persist and stop the store.
    pub async fn finish(&self, queries: &Queries) -> anyhow::Result<()> {
        if let Ok(handle) = queries.store().get() {
            handle.close().await?;
        }
        Ok(())
    }
}

/// A close failure after a rejected login is logged; the login error is
/// the one returned.
fn report_close_failure(result: anyhow::Result<()>) {
    if let Err(err) = result {
        warn!(error = %err, "failed to close store after rejected login");
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let make_writer = {
            let captured = captured.clone();
            move || captured.clone()
        };
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_target(false)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_close_failure_is_logged() {
        let output = logged(|| report_close_failure(Err(anyhow::anyhow!("disk full"))));
        assert!(output.contains("WARN"));
        assert!(output.contains("rejected login"));
        assert!(output.contains("disk full"));
    }

    #[test]
    fn test_clean_close_logs_nothing() {
        let output = logged(|| report_close_failure(Ok(())));
        assert!(output.is_empty());
    }
}
