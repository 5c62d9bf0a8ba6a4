use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use vitals_core::VERSION;

use crate::config::VaultBackend;

/// Vitals - an encrypted, local-first personal health log
#[derive(Parser)]
#[command(name = "vitals")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the encrypted store
    #[arg(short, long, global = true, env = crate::constants::env::STORE)]
    pub store: Option<String>,

    /// Username to log in as
    #[arg(short, long, global = true, env = crate::constants::env::USER)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the config, the store key and an empty encrypted store
    Init(InitArgs),

    /// Add a user to the store
    Register(RegisterArgs),

    /// Show the latest readings across every domain
    Summary,

    /// Show or record activity
    Activity(ActivityArgs),

    /// Show or record heart rate readings
    Heart(HeartArgs),

    /// Show or record calorie goal and intake
    Nutrition(NutritionArgs),

    /// Manage medications
    Meds {
        #[command(subcommand)]
        command: Option<MedsCommand>,
    },

    /// Manage medical records
    Records {
        #[command(subcommand)]
        command: Option<RecordsCommand>,
    },

    /// Check config, vault and store health
    Doctor,

    /// Development helpers
    #[cfg(feature = "dev-tools")]
    Dev {
        #[command(subcommand)]
        command: DevCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Where the vault keeps the store key
    #[arg(long, value_enum)]
    pub vault: Option<VaultBackend>,

    /// Keyfile directory (keyfile vault only)
    #[arg(long)]
    pub keyfile_path: Option<String>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `register` command
#[derive(Args)]
pub struct RegisterArgs {
    /// New username (prompted when omitted)
    #[arg(value_name = "USERNAME")]
    pub username: Option<String>,
}

/// Arguments for the `activity` command
#[derive(Args, Default)]
pub struct ActivityArgs {
    /// Steps walked
    #[arg(long)]
    pub steps: Option<i64>,

    /// Distance covered
    #[arg(long)]
    pub distance: Option<i64>,

    /// Active minutes
    #[arg(long)]
    pub minutes: Option<i64>,

    /// Activity label (e.g. running)
    #[arg(long)]
    pub label: Option<String>,

    /// Free-text log entry
    #[arg(long)]
    pub log: Option<String>,
}

impl ActivityArgs {
    pub fn is_empty(&self) -> bool {
        self.steps.is_none()
            && self.distance.is_none()
            && self.minutes.is_none()
            && self.label.is_none()
            && self.log.is_none()
    }
}

/// Arguments for the `heart` command
#[derive(Args)]
pub struct HeartArgs {
    /// Current heart rate (bpm)
    #[arg(long)]
    pub rate: Option<i64>,

    /// Resting heart rate (bpm)
    #[arg(long)]
    pub resting: Option<i64>,

    /// Recovery heart rate (bpm)
    #[arg(long)]
    pub recovery: Option<i64>,
}

/// Arguments for the `nutrition` command
#[derive(Args)]
pub struct NutritionArgs {
    /// Daily calorie goal
    #[arg(long)]
    pub goal: Option<i64>,

    /// Calories consumed
    #[arg(long)]
    pub consumed: Option<i64>,
}

#[derive(Subcommand)]
pub enum MedsCommand {
    /// List medications
    List,

    /// Add a medication
    Add {
        /// Medication name
        #[arg(value_name = "NAME")]
        name: String,

        /// Dosage or instructions
        #[arg(long)]
        description: Option<String>,

        /// Mark as part of the regular schedule
        #[arg(long)]
        scheduled: bool,
    },

    /// Mark a medication as taken
    Take {
        /// Medication id (see `vitals meds list`)
        #[arg(value_name = "ID")]
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum RecordsCommand {
    /// Show medical history, newest first
    List,

    /// Add a medical record
    Add {
        /// Visit date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Doctor seen
        #[arg(long)]
        doctor: String,

        /// Diagnosis
        #[arg(long)]
        diagnosis: String,
    },
}

#[cfg(feature = "dev-tools")]
#[derive(Subcommand)]
pub enum DevCommand {
    /// Insert sample users and readings
    Seed {
        /// Seed even when the store already has users
        #[arg(long)]
        allow_existing: bool,
    },

    /// Drop tables (requires `allow_reset = true` under [dev])
    Reset {
        /// Tables to drop (e.g. heart, records); all when omitted
        #[arg(value_name = "TABLE")]
        tables: Vec<String>,
    },
}
