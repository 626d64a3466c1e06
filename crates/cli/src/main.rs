use crate::error::CliError;
use clap::Parser;
use commands::Commands;
use engine_core::config::{EtlConfig, TransformerSpec};
use engine_runtime::{
    error::MigrationError,
    mapped::MappedTransformer,
    rollback::RollbackManager,
    runner::{RunOptions, Runner},
};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod endpoints;
mod error;
mod output;

#[derive(Parser)]
#[command(name = "transfuse", version = "0.1.0", about = "Batch data migration tool")]
struct Cli {
    #[arg(long, global = true, default_value = "info", help = "Log level filter")]
    log_level: String,

    #[arg(long, global = true, help = "Write logs to this file instead of stderr")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run {
            config,
            transformer,
            only,
            dry_run,
            batch_size,
            json,
        } => {
            let mut config = EtlConfig::load(&config)?;
            if let Some(batch_size) = batch_size {
                config.transformation.batch_size = batch_size;
                config.validate()?;
            }
            run_transformers(&config, transformer, only, dry_run, json).await?;
        }
        Commands::Snapshots { config } => {
            let config = EtlConfig::load(&config)?;
            let manager = open_manager(&config)?;
            output::print_snapshots(&manager.list_snapshots()?);
        }
        Commands::Rollback {
            config,
            migration_id,
        } => {
            let config = EtlConfig::load(&config)?;
            let manager = open_manager(&config)?;
            let complete = manager.rollback_migration(&migration_id).await?;
            let verified = manager.verify_rollback(&migration_id).await?;
            if complete && verified {
                println!("Migration '{migration_id}' rolled back and verified.");
            } else {
                return Err(MigrationError::RollbackIncomplete {
                    migration_id,
                    detail: if complete {
                        "row counts do not match the snapshot".into()
                    } else {
                        "one or more entities could not be restored".into()
                    },
                }
                .into());
            }
        }
        Commands::Cleanup { config, days } => {
            let config = EtlConfig::load(&config)?;
            let manager = open_manager(&config)?;
            let days = days.unwrap_or(config.rollback.retention_days);
            let removed = manager.cleanup_old_snapshots(days)?;
            println!("Removed {removed} snapshot(s) older than {days} day(s).");
        }
        Commands::History {
            config,
            limit,
            json,
        } => {
            let config = EtlConfig::load(&config)?;
            let manager = open_manager(&config)?;
            output::print_history(&manager.audit_history(limit)?, json)?;
        }
    }

    Ok(())
}

fn init_tracing(level: &str, log_file: Option<&std::path::Path>) -> Result<(), CliError> {
    let filter = EnvFilter::try_new(level)
        .map_err(|err| CliError::Unexpected(format!("invalid log level '{level}': {err}")))?;

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn open_manager(config: &EtlConfig) -> Result<Arc<RollbackManager>, CliError> {
    let connections = config
        .connections
        .as_ref()
        .ok_or_else(|| CliError::Unexpected("config defines no connections".into()))?;
    let destination = endpoints::build_destination(&connections.target)?;
    Ok(Arc::new(RollbackManager::open(
        &config.rollback,
        destination,
    )?))
}

/// Picks the transformers to run, preserving config order.
fn select_transformers<'a>(
    config: &'a EtlConfig,
    transformer: Option<&str>,
    only: &[String],
) -> Result<Vec<&'a TransformerSpec>, CliError> {
    let find = |name: &str| -> Result<&'a TransformerSpec, CliError> {
        config
            .transformers
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| MigrationError::UnknownTransformer(name.to_string()).into())
    };

    let selected: Vec<&TransformerSpec> = if let Some(name) = transformer {
        vec![find(name)?]
    } else if !only.is_empty() {
        only.iter()
            .map(|name| find(name))
            .collect::<Result<_, _>>()?
    } else {
        config.transformers.iter().collect()
    };

    if selected.is_empty() {
        return Err(CliError::NoTransformers);
    }
    Ok(selected)
}

async fn run_transformers(
    config: &EtlConfig,
    transformer: Option<String>,
    only: Vec<String>,
    dry_run: bool,
    json: bool,
) -> Result<(), CliError> {
    let connections = config
        .connections
        .as_ref()
        .ok_or_else(|| CliError::Unexpected("config defines no connections".into()))?;
    let source = endpoints::build_source(&connections.source)?;
    let destination = endpoints::build_destination(&connections.target)?;
    let rollback = Arc::new(RollbackManager::open(&config.rollback, destination.clone())?);
    let runner = Runner::new(source, destination, config, rollback);

    let selected = select_transformers(config, transformer.as_deref(), &only)?;
    let total = selected.len();

    let mut reports = Vec::with_capacity(total);
    let mut failed = 0usize;
    for spec in selected {
        let transformer = MappedTransformer::from_spec(spec.clone());
        let options = RunOptions {
            dry_run,
            ..Default::default()
        };
        match runner.safe_run(&transformer, options).await {
            Ok(entry) => reports.push(entry),
            Err(err) => {
                failed += 1;
                error!(transformer = %spec.name, error = %err, "transformer failed");
            }
        }
    }

    output::print_run_reports(&reports, json)?;
    for recommendation in runner.profiler().report().recommendations {
        info!(%recommendation, "performance hint");
    }

    if failed > 0 {
        return Err(CliError::PartialFailure { failed, total });
    }
    Ok(())
}
