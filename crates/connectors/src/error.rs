use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Failed to encode record: {0}")]
    Encode(String),

    #[error("Failed to decode record: {0}")]
    Decode(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("Write rejected: {0}")]
    WriteRejected(String),

    #[error("Unexpected error: {0}")]
    Other(String),
}
