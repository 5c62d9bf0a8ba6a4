//! Vitals CLI - an encrypted, local-first personal health log
//!
//! This is the command-line interface for Vitals. It wires the config file,
//! the key vault and the encrypted store from `vitals-core` to one
//! subcommand per health domain.

use std::io;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use vitals_core::VERSION;

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod output;

use app::AppContext;
use cli::{Cli, Commands};
use commands::*;
use constants::{env, DEFAULT_LOG_FILTER};

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => errors::classify(&err.into()).exit(),
    };

    if let Err(err) = runtime.block_on(run(&cli)) {
        errors::classify(&err).exit();
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(env::LOG)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli);

    match &cli.command {
        Some(Commands::Init(args)) => handle_init(&ctx, args).await,
        Some(Commands::Register(args)) => handle_register(&ctx, args).await,
        Some(Commands::Summary) => handle_summary(&ctx).await,
        Some(Commands::Activity(args)) => handle_activity(&ctx, args).await,
        Some(Commands::Heart(args)) => handle_heart(&ctx, args).await,
        Some(Commands::Nutrition(args)) => handle_nutrition(&ctx, args).await,
        Some(Commands::Meds { command }) => handle_meds(&ctx, command.as_ref()).await,
        Some(Commands::Records { command }) => handle_records(&ctx, command.as_ref()).await,
        Some(Commands::Doctor) => handle_doctor(&ctx).await,
        #[cfg(feature = "dev-tools")]
        Some(Commands::Dev { command }) => handle_dev(&ctx, command).await,
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "vitals", &mut io::stdout());
            Ok(())
        }
        None => {
            println!("Vitals v{}", VERSION);
            println!("\nRun `vitals --help` for usage information.");
            Ok(())
        }
    }
}
