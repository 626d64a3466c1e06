use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot lifecycle. Created means the backup is durable but no migration
/// write has happened yet; InProgress brackets the actual writes; Committed
/// keeps the backup around per retention policy; RolledBack means the
/// restore ran and the snapshot is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStage {
    Created,
    InProgress,
    Committed,
    RolledBack,
}

impl SnapshotStage {
    /// Active snapshots block a second snapshot under the same migration id.
    pub fn is_active(&self) -> bool {
        matches!(self, SnapshotStage::Created | SnapshotStage::InProgress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub entity: String,
    pub row_count: u64,
}

/// Descriptor of one pre-migration backup. The row payload itself lives
/// under separate keys in the snapshot store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub migration_id: String,
    pub transformer: String,
    pub created_at: DateTime<Utc>,
    pub stage: SnapshotStage,
    pub entities: Vec<EntitySnapshot>,
}
