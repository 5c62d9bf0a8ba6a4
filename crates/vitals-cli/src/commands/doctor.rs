use vitals_core::{StoreLocation, TableName};

use crate::app::AppContext;
use crate::errors::CliError;
use crate::output::print_json;

pub async fn handle_doctor(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let config_path = ctx.config_path()?.clone();
    let config = ctx
        .config()
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    let location = ctx.store_location()?;
    let queries = ctx.open()?;
    let handle = queries.store().get()?;
    let integrity = handle.check_integrity().await;
    let tables = handle.table_names().await;
    ctx.finish(&queries).await?;

    if let Err(err) = integrity {
        eprintln!("Doctor: FAILED");
        eprintln!("- integrity check: FAILED");
        eprintln!("- error: {}", err);
        return Err(CliError::integrity_failed(
            "Doctor failed",
            "Restore the store file from a backup before retrying.",
        )
        .into());
    }

    let tables = tables?;
    let missing: Vec<&str> = TableName::ALL
        .iter()
        .map(|t| t.as_str())
        .filter(|name| !tables.iter().any(|t| t == name))
        .collect();
    if !missing.is_empty() {
        eprintln!("Doctor: FAILED");
        eprintln!("- missing tables: {}", missing.join(", "));
        return Err(CliError::integrity_failed(
            "Doctor failed",
            "Run any vitals command once to recreate the schema.",
        )
        .into());
    }

    if ctx.json() {
        let store = match &location {
            StoreLocation::File(path) => path.display().to_string(),
            StoreLocation::Memory => "memory".to_string(),
        };
        return print_json(&serde_json::json!({
            "ok": true,
            "config": config_path.display().to_string(),
            "config_exists": config_path.exists(),
            "vault": config.vault.backend,
            "store": store,
            "tables": tables,
        }));
    }
    if !ctx.quiet() {
        println!("Doctor: OK");
        if config_path.exists() {
            println!("- config: OK ({})", config_path.display());
        } else {
            println!("- config: defaults ({} not found)", config_path.display());
        }
        println!("- vault: OK ({:?})", config.vault.backend);
        match &location {
            StoreLocation::File(path) => println!("- store: OK ({})", path.display()),
            StoreLocation::Memory => println!("- store: OK (memory)"),
        }
        println!("- integrity: OK");
        println!("- tables: {}", tables.join(", "));
    }
    Ok(())
}
