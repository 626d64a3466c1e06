use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("An active snapshot already exists for migration '{0}'")]
    DuplicateSnapshot(String),

    #[error("No snapshot found for migration '{0}'")]
    NotFound(String),

    #[error("Snapshot storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Failed to serialize snapshot data: {0}")]
    Serialization(String),
}
