use crate::run::stats::{BatchStats, RunStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
    RolledBack,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// Persisted audit record for one transformer run. The JSON layout is read
/// by external tooling; field names are part of the contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub migration_id: String,
    pub transformer: String,
    pub status: RunStatus,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub statistics: RunStats,
    pub batches: BatchStats,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl AuditEntry {
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
