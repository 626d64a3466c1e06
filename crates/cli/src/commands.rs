use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured transformers against the target
    Run {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(
            long,
            help = "Run a single transformer by name instead of all of them"
        )]
        transformer: Option<String>,

        #[arg(
            long,
            value_delimiter = ',',
            help = "Comma-separated subset of transformers to run, in config order"
        )]
        only: Vec<String>,

        #[arg(long, help = "Validate and transform without writing anything")]
        dry_run: bool,

        #[arg(long, help = "Override the configured batch size")]
        batch_size: Option<usize>,

        #[arg(long, help = "Print the per-transformer reports as JSON")]
        json: bool,
    },
    /// List migration snapshots, newest first
    Snapshots {
        #[arg(long, help = "Config file path")]
        config: String,
    },
    /// Restore the destination from a migration snapshot
    Rollback {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Migration ID whose snapshot to restore")]
        migration_id: String,
    },
    /// Delete finished snapshots past the retention window
    Cleanup {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Retention in days, overriding the configured value")]
        days: Option<u32>,
    },
    /// Show recent audit log entries
    History {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, default_value_t = 20, help = "Maximum entries to show")]
        limit: usize,

        #[arg(long, help = "Print entries as JSON instead of a table")]
        json: bool,
    },
}
