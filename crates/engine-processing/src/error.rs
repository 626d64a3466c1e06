use thiserror::Error;

/// Per-record transform failure. The orchestrator logs these, drops the
/// record, and keeps going.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Transformation failed: {0}")]
    Transformation(String),

    #[error("Missing required field '{field}'")]
    MissingField { field: String },

    #[error("Cannot convert field '{field}': {reason}")]
    Conversion { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RuleBuildError {
    #[error("Invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}
