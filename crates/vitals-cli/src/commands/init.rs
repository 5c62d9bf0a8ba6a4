use vitals_core::StoreLocation;

use crate::app::AppContext;
use crate::cli::InitArgs;
use crate::config::{default_store_path, write_config, VaultBackend, VitalsConfig};
use crate::errors::CliError;

pub async fn handle_init(ctx: &AppContext<'_>, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = ctx.config_path()?.clone();

    if config_path.exists() && !args.force {
        if args.vault.is_some() || args.keyfile_path.is_some() {
            return Err(CliError::invalid_input(format!(
                "Config already exists at {}; pass --force to overwrite it",
                config_path.display()
            ))
            .into());
        }
    } else {
        let store_path = match ctx.cli().store.as_deref() {
            Some(path) if !path.trim().is_empty() => path.into(),
            _ => default_store_path()?,
        };
        let config = VitalsConfig::new(
            store_path,
            args.vault.unwrap_or_default(),
            args.keyfile_path.as_ref().map(Into::into),
        );
        write_config(&config_path, &config)?;
        if !ctx.quiet() {
            println!("Wrote config to {}", config_path.display());
        }
    }

    let location = ctx.store_location()?;
    let existed = matches!(&location, StoreLocation::File(path) if path.exists());

    let queries = ctx.open_or_create()?;
    ctx.finish(&queries).await?;

    if ctx.quiet() {
        return Ok(());
    }
    match location {
        StoreLocation::File(path) if existed => {
            println!("Store already initialized at {}", path.display());
        }
        StoreLocation::File(path) => {
            println!("Initialized encrypted store at {}", path.display());
            println!("Next: vitals register <username>");
        }
        StoreLocation::Memory => {
            println!("Vault backend is memory; nothing was written and data will not persist.");
        }
    }
    if ctx.config()?.vault.backend == VaultBackend::Keyfile {
        println!(
            "Note: the store key sits unencrypted in {}. Keep that directory private.",
            ctx.config()?.keyfile_dir()?.display()
        );
    }
    Ok(())
}
