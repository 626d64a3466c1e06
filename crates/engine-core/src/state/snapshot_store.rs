use crate::{
    error::SnapshotError,
    state::models::{SnapshotMeta, SnapshotStage},
};
use model::{records::record::Record, run::audit::AuditEntry};
use std::path::Path;

/// Durable home for migration snapshots and the audit log, one sled db under
/// the configured backup directory. Snapshot metadata and row payloads are
/// bincode; audit entries are stored as JSON bytes so external tooling can
/// read them without linking this crate.
pub struct SnapshotStore {
    db: sled::Db,
}

impl SnapshotStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    #[inline]
    fn meta_key(migration_id: &str) -> String {
        format!("snap:{migration_id}")
    }

    #[inline]
    fn rows_key(migration_id: &str, entity: &str) -> String {
        format!("rows:{migration_id}:{entity}")
    }

    pub fn put_meta(&self, meta: &SnapshotMeta) -> Result<(), SnapshotError> {
        let bytes = bincode::serialize(meta)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        self.db.insert(Self::meta_key(&meta.migration_id), bytes)?;
        self.db.flush()?;
        Ok(())
    }

    pub fn get_meta(&self, migration_id: &str) -> Result<Option<SnapshotMeta>, SnapshotError> {
        match self.db.get(Self::meta_key(migration_id))? {
            Some(bytes) => Ok(Some(
                bincode::deserialize(&bytes)
                    .map_err(|e| SnapshotError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub fn set_stage(
        &self,
        migration_id: &str,
        stage: SnapshotStage,
    ) -> Result<(), SnapshotError> {
        let mut meta = self
            .get_meta(migration_id)?
            .ok_or_else(|| SnapshotError::NotFound(migration_id.to_string()))?;
        meta.stage = stage;
        self.put_meta(&meta)
    }

    pub fn has_active(&self, migration_id: &str) -> Result<bool, SnapshotError> {
        Ok(self
            .get_meta(migration_id)?
            .is_some_and(|meta| meta.stage.is_active()))
    }

    pub fn put_rows(
        &self,
        migration_id: &str,
        entity: &str,
        rows: &[Record],
    ) -> Result<(), SnapshotError> {
        let bytes = bincode::serialize(rows)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        self.db.insert(Self::rows_key(migration_id, entity), bytes)?;
        self.db.flush()?;
        Ok(())
    }

    pub fn get_rows(
        &self,
        migration_id: &str,
        entity: &str,
    ) -> Result<Option<Vec<Record>>, SnapshotError> {
        match self.db.get(Self::rows_key(migration_id, entity))? {
            Some(bytes) => Ok(Some(
                bincode::deserialize(&bytes)
                    .map_err(|e| SnapshotError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// All snapshot descriptors, newest first.
    pub fn list(&self) -> Result<Vec<SnapshotMeta>, SnapshotError> {
        let mut metas = Vec::new();
        for item in self.db.scan_prefix("snap:") {
            let (_key, bytes) = item?;
            let meta: SnapshotMeta = bincode::deserialize(&bytes)
                .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
            metas.push(meta);
        }
        metas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(metas)
    }

    /// Removes a snapshot and its row payloads. Returns false when the
    /// migration id was unknown.
    pub fn remove(&self, migration_id: &str) -> Result<bool, SnapshotError> {
        let Some(meta) = self.get_meta(migration_id)? else {
            return Ok(false);
        };
        for entity in &meta.entities {
            self.db.remove(Self::rows_key(migration_id, &entity.entity))?;
        }
        self.db.remove(Self::meta_key(migration_id))?;
        self.db.flush()?;
        Ok(true)
    }

    pub fn append_audit(&self, entry: &AuditEntry) -> Result<(), SnapshotError> {
        let seq = entry
            .started_at
            .timestamp_nanos_opt()
            .unwrap_or(0);
        let key = format!("log:{seq:020}:{}", entry.migration_id);
        let bytes = serde_json::to_vec(entry)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        self.db.insert(key, bytes)?;
        self.db.flush()?;
        Ok(())
    }

    /// Audit entries, newest first.
    pub fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>, SnapshotError> {
        let mut entries = Vec::new();
        for item in self.db.scan_prefix("log:") {
            let (_key, bytes) = item?;
            let entry: AuditEntry = serde_json::from_slice(&bytes)
                .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
            entries.push(entry);
        }
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}
