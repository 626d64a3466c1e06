use crate::error::MigrationError;
use chrono::{Duration, Utc};
use connectors::store::DataDestination;
use engine_core::{
    config::RollbackConfig,
    error::SnapshotError,
    state::{
        models::{EntitySnapshot, SnapshotMeta, SnapshotStage},
        snapshot_store::SnapshotStore,
    },
};
use model::run::audit::AuditEntry;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Snapshots destination entities before a migration touches them and
/// restores them afterwards on demand. Restoration is per entity and not
/// atomic across entities: a failure mid-rollback leaves the entities that
/// already restored in place, which `rollback_migration` reports as
/// `Ok(false)`.
pub struct RollbackManager {
    store: SnapshotStore,
    destination: Arc<dyn DataDestination>,
}

impl RollbackManager {
    pub fn open(
        config: &RollbackConfig,
        destination: Arc<dyn DataDestination>,
    ) -> Result<Self, SnapshotError> {
        let store = SnapshotStore::open(&config.backup_directory)?;
        Ok(Self { store, destination })
    }

    /// Captures the current rows of every affected entity. Fails loudly when
    /// the migration id still has an active snapshot — overwriting it would
    /// destroy a live restore point. A finished snapshot under the same id
    /// is replaced.
    pub async fn create_snapshot(
        &self,
        migration_id: &str,
        transformer: &str,
        entities: &[String],
    ) -> Result<SnapshotMeta, MigrationError> {
        if self.store.has_active(migration_id)? {
            return Err(SnapshotError::DuplicateSnapshot(migration_id.to_string()).into());
        }
        self.store.remove(migration_id)?;

        let mut entity_snapshots = Vec::with_capacity(entities.len());
        for entity in entities {
            let rows = self.destination.fetch_all(entity).await?;
            info!(migration_id, entity = %entity, rows = rows.len(), "snapshotting entity");
            self.store.put_rows(migration_id, entity, &rows)?;
            entity_snapshots.push(EntitySnapshot {
                entity: entity.clone(),
                row_count: rows.len() as u64,
            });
        }

        let meta = SnapshotMeta {
            migration_id: migration_id.to_string(),
            transformer: transformer.to_string(),
            created_at: Utc::now(),
            stage: SnapshotStage::Created,
            entities: entity_snapshots,
        };
        self.store.put_meta(&meta)?;
        Ok(meta)
    }

    pub fn mark_in_progress(&self, migration_id: &str) -> Result<(), SnapshotError> {
        self.store.set_stage(migration_id, SnapshotStage::InProgress)
    }

    pub fn mark_committed(&self, migration_id: &str) -> Result<(), SnapshotError> {
        self.store.set_stage(migration_id, SnapshotStage::Committed)
    }

    /// Restores every entity in the snapshot. Returns `Ok(true)` when all
    /// entities restored, `Ok(false)` when some did and some did not. The
    /// stage moves to `RolledBack` only on a complete restore, so a partial
    /// rollback stays visible in `list_snapshots`.
    pub async fn rollback_migration(&self, migration_id: &str) -> Result<bool, MigrationError> {
        let meta = self
            .store
            .get_meta(migration_id)?
            .ok_or_else(|| SnapshotError::NotFound(migration_id.to_string()))?;

        let mut restored = 0usize;
        for entity in &meta.entities {
            let rows = self
                .store
                .get_rows(migration_id, &entity.entity)?
                .unwrap_or_default();
            match self.destination.replace_all(&entity.entity, &rows).await {
                Ok(count) => {
                    info!(migration_id, entity = %entity.entity, rows = count, "entity restored");
                    restored += 1;
                }
                Err(err) => {
                    error!(migration_id, entity = %entity.entity, error = %err, "entity restore failed");
                }
            }
        }

        let complete = restored == meta.entities.len();
        if complete {
            self.store
                .set_stage(migration_id, SnapshotStage::RolledBack)?;
        } else {
            warn!(
                migration_id,
                restored,
                total = meta.entities.len(),
                "partial rollback"
            );
        }
        Ok(complete)
    }

    /// Checks that every entity's current row count matches the snapshot.
    /// A count match is necessary but not sufficient; it catches the common
    /// failure of a restore that never ran.
    pub async fn verify_rollback(&self, migration_id: &str) -> Result<bool, MigrationError> {
        let meta = self
            .store
            .get_meta(migration_id)?
            .ok_or_else(|| SnapshotError::NotFound(migration_id.to_string()))?;

        for entity in &meta.entities {
            let current = self.destination.count_rows(&entity.entity).await?;
            if current != entity.row_count {
                warn!(
                    migration_id,
                    entity = %entity.entity,
                    expected = entity.row_count,
                    actual = current,
                    "rollback verification mismatch"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// All snapshot descriptors, newest first.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>, SnapshotError> {
        self.store.list()
    }

    /// Deletes finished snapshots older than `retention_days`. Active
    /// snapshots (created or in-progress) are kept regardless of age.
    /// Returns how many were removed.
    pub fn cleanup_old_snapshots(&self, retention_days: u32) -> Result<usize, SnapshotError> {
        let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
        let mut removed = 0;
        for meta in self.store.list()? {
            if meta.created_at < cutoff && !meta.stage.is_active() {
                if self.store.remove(&meta.migration_id)? {
                    info!(migration_id = %meta.migration_id, "expired snapshot removed");
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    pub fn append_audit(&self, entry: &AuditEntry) -> Result<(), SnapshotError> {
        self.store.append_audit(entry)
    }

    /// Most recent audit entries, newest first.
    pub fn audit_history(&self, limit: usize) -> Result<Vec<AuditEntry>, SnapshotError> {
        self.store.list_audit(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::memory::MemoryStore;
    use model::{core::value::Value, records::record::Record};
    use tempfile::tempdir;

    fn patient(id: i64) -> Record {
        Record::with_fields("patients", vec![("id", Value::Int(id))])
    }

    async fn manager_with_rows(dir: &std::path::Path, rows: Vec<Record>) -> (RollbackManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.seed("patients", rows);
        let config = RollbackConfig {
            backup_directory: dir.to_path_buf(),
            ..Default::default()
        };
        let manager = RollbackManager::open(&config, store.clone()).unwrap();
        (manager, store)
    }

    #[tokio::test]
    async fn snapshot_restore_round_trip() {
        let dir = tempdir().unwrap();
        let (manager, store) =
            manager_with_rows(dir.path(), vec![patient(1), patient(2)]).await;

        manager
            .create_snapshot("m-1", "patients", &["patients".to_string()])
            .await
            .unwrap();

        // migration writes more rows, then fails
        store
            .bulk_insert("patients", &[patient(3), patient(4)])
            .await
            .unwrap();
        assert_eq!(store.count_rows("patients").await.unwrap(), 4);

        assert!(manager.rollback_migration("m-1").await.unwrap());
        assert_eq!(store.count_rows("patients").await.unwrap(), 2);
        assert!(manager.verify_rollback("m-1").await.unwrap());

        let listed = manager.list_snapshots().unwrap();
        assert_eq!(listed[0].stage, SnapshotStage::RolledBack);
    }

    #[tokio::test]
    async fn duplicate_migration_id_is_rejected() {
        let dir = tempdir().unwrap();
        let (manager, _store) = manager_with_rows(dir.path(), vec![patient(1)]).await;

        manager
            .create_snapshot("m-1", "patients", &["patients".to_string()])
            .await
            .unwrap();
        let err = manager
            .create_snapshot("m-1", "patients", &["patients".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Snapshot(SnapshotError::DuplicateSnapshot(_))
        ));

        // a finished snapshot under the same id may be replaced
        manager.mark_committed("m-1").unwrap();
        manager
            .create_snapshot("m-1", "patients", &["patients".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn verify_detects_unrestored_state() {
        let dir = tempdir().unwrap();
        let (manager, store) = manager_with_rows(dir.path(), vec![patient(1)]).await;

        manager
            .create_snapshot("m-1", "patients", &["patients".to_string()])
            .await
            .unwrap();
        store.bulk_insert("patients", &[patient(2)]).await.unwrap();

        assert!(!manager.verify_rollback("m-1").await.unwrap());
    }

    #[tokio::test]
    async fn cleanup_keeps_recent_and_active_snapshots() {
        let dir = tempdir().unwrap();
        let (manager, _store) = manager_with_rows(dir.path(), vec![patient(1)]).await;

        // aged committed snapshot: should be removed
        let mut old = manager
            .create_snapshot("m-old", "patients", &["patients".to_string()])
            .await
            .unwrap();
        manager.mark_committed("m-old").unwrap();
        old.created_at = Utc::now() - Duration::days(45);
        old.stage = SnapshotStage::Committed;
        manager.store.put_meta(&old).unwrap();

        // aged but still active: must survive
        let mut stuck = manager
            .create_snapshot("m-stuck", "patients", &["patients".to_string()])
            .await
            .unwrap();
        stuck.created_at = Utc::now() - Duration::days(45);
        manager.store.put_meta(&stuck).unwrap();

        // fresh committed snapshot: must survive
        manager
            .create_snapshot("m-new", "patients", &["patients".to_string()])
            .await
            .unwrap();
        manager.mark_committed("m-new").unwrap();

        assert_eq!(manager.cleanup_old_snapshots(30).unwrap(), 1);
        let remaining: Vec<String> = manager
            .list_snapshots()
            .unwrap()
            .into_iter()
            .map(|m| m.migration_id)
            .collect();
        assert!(remaining.contains(&"m-stuck".to_string()));
        assert!(remaining.contains(&"m-new".to_string()));
        assert!(!remaining.contains(&"m-old".to_string()));
    }
}
