use connectors::error::StoreError;
use engine_core::error::{ConfigError, SnapshotError};
use engine_processing::error::RuleBuildError;
use thiserror::Error;

/// Top-level errors for the migration runtime.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Invalid validation rule: {0}")]
    RuleBuild(#[from] RuleBuildError),

    /// Strict validation mode refused the batch; the per-rule messages are
    /// in the run outcome the caller already holds.
    #[error(
        "Validation aborted transformer '{transformer}': {error_records} record(s) failed at error severity"
    )]
    ValidationAborted {
        transformer: String,
        error_records: u64,
    },

    /// One or more batches exhausted their retries.
    #[error("Transformer '{transformer}': {failed} batch(es) failed after retries")]
    BatchesFailed { transformer: String, failed: u64 },

    #[error("Unknown transformer '{0}'")]
    UnknownTransformer(String),

    #[error("Rollback of migration '{migration_id}' incomplete: {detail}")]
    RollbackIncomplete { migration_id: String, detail: String },
}
