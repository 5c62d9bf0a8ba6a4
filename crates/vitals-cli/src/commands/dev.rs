use std::collections::BTreeSet;

use vitals_core::{SeedMode, TableName};

use crate::app::AppContext;
use crate::cli::DevCommand;

pub async fn handle_dev(ctx: &AppContext<'_>, command: &DevCommand) -> anyhow::Result<()> {
    match command {
        DevCommand::Seed { allow_existing } => seed(ctx, *allow_existing).await,
        DevCommand::Reset { tables } => reset(ctx, tables).await,
    }
}

async fn seed(ctx: &AppContext<'_>, allow_existing: bool) -> anyhow::Result<()> {
    let mode = if allow_existing || ctx.config()?.dev.allow_seed_existing {
        SeedMode::AllowExisting
    } else {
        SeedMode::RequireEmpty
    };

    let queries = ctx.open_or_create()?;
    let handle = queries.store().get()?;
    let seeded = handle.seed_sample_data(mode).await;
    ctx.finish(&queries).await?;
    let inserted = seeded?;

    if !ctx.quiet() {
        println!("Inserted {} sample rows (users user1..user5, passwords pass1..pass5)", inserted);
    }
    Ok(())
}

async fn reset(ctx: &AppContext<'_>, names: &[String]) -> anyhow::Result<()> {
    let store_config = ctx.store_config()?;
    let guard = store_config.reset_guard()?;

    let tables: BTreeSet<TableName> = if names.is_empty() {
        TableName::ALL.into_iter().collect()
    } else {
        names
            .iter()
            .map(|name| name.parse::<TableName>())
            .collect::<Result<_, _>>()?
    };

    let queries = ctx.open()?;
    let handle = queries.store().get()?;
    let dropped = handle.drop_tables(tables, &guard).await;
    ctx.finish(&queries).await?;
    let dropped = dropped?;

    if !ctx.quiet() {
        if dropped.is_empty() {
            println!("Nothing to drop");
        } else {
            let names: Vec<&str> = dropped.iter().map(|t| t.as_str()).collect();
            println!("Dropped {}", names.join(", "));
        }
    }
    Ok(())
}
