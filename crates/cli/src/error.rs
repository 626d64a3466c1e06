use engine_core::error::{ConfigError, SnapshotError};
use engine_runtime::error::MigrationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the configuration file: {0}")]
    ConfigFileRead(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Migration failed: {0}")]
    Migration(#[from] MigrationError),

    #[error("Snapshot store error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Endpoint of kind '{kind}' cannot be used as a {role}")]
    UnsupportedEndpoint { kind: String, role: String },

    #[error("The configuration defines no transformers")]
    NoTransformers,

    #[error("{failed} of {total} transformer(s) failed")]
    PartialFailure { failed: usize, total: usize },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
