use crate::{error::MigrationError, rollback::RollbackManager, transformer::Transformer};
use chrono::Utc;
use connectors::{
    error::StoreError,
    store::{DataDestination, DataSource},
};
use engine_core::{
    config::{EtlConfig, TransformationConfig},
    profiler::Profiler,
    retry::{RetryDisposition, RetryPolicy},
};
use engine_processing::{
    batch::{process_batch, BatchOutcome},
    validation::engine::{summarize, ValidationEngine},
};
use model::{
    core::value::Value,
    records::{batch::RecordBatch, record::Record},
    run::{
        audit::{AuditEntry, RunStatus},
        stats::{BatchStats, RunStats},
    },
    validation::severity::{Severity, ValidationMode},
};
use std::{collections::HashSet, sync::Arc};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Full pipeline minus writes: nothing is persisted, no snapshot is
    /// taken, and the audit entry is flagged.
    pub dry_run: bool,
    /// Per-run override; snapshots also require `rollback.enabled` in config.
    pub enable_rollback: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            enable_rollback: true,
        }
    }
}

/// Everything a finished (or attempted) run reports. On failure the counts
/// reflect whatever the run reached before the error, so the audit log keeps
/// the partial progress.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub stats: RunStats,
    pub batches: BatchStats,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Drives one transformer end to end, one extraction page at a time: each
/// page is validated, transformed, deduplicated and persisted before the
/// next page is fetched, so memory stays bounded by the batch size.
/// `safe_run` wraps the whole thing in a snapshot so a failed run can
/// restore the destination.
pub struct Runner {
    source: Arc<dyn DataSource>,
    destination: Arc<dyn DataDestination>,
    config: TransformationConfig,
    profiler: Profiler,
    rollback: Arc<RollbackManager>,
    snapshots_enabled: bool,
}

impl Runner {
    pub fn new(
        source: Arc<dyn DataSource>,
        destination: Arc<dyn DataDestination>,
        config: &EtlConfig,
        rollback: Arc<RollbackManager>,
    ) -> Self {
        Self {
            source,
            destination,
            config: config.transformation.clone(),
            profiler: Profiler::new(config.profiler),
            rollback,
            snapshots_enabled: config.rollback.enabled,
        }
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// Runs the transformer with snapshot protection and audit logging.
    /// On failure the destination is rolled back to its pre-run state and
    /// the error is re-raised; the audit entry is appended either way and
    /// carries the statistics the run accumulated up to the error.
    pub async fn safe_run(
        &self,
        transformer: &dyn Transformer,
        options: RunOptions,
    ) -> Result<AuditEntry, MigrationError> {
        let migration_id = format!("{}-{}", transformer.name(), Uuid::new_v4());
        let started_at = Utc::now();
        let snapshotting = self.snapshots_enabled && options.enable_rollback && !options.dry_run;

        if snapshotting {
            self.rollback
                .create_snapshot(
                    &migration_id,
                    transformer.name(),
                    &transformer.affected_entities(),
                )
                .await?;
            self.rollback.mark_in_progress(&migration_id)?;
        }

        info!(
            %migration_id,
            transformer = transformer.name(),
            dry_run = options.dry_run,
            "migration started"
        );

        let mut outcome = RunOutcome::default();
        match self.run(transformer, options.dry_run, &mut outcome).await {
            Ok(()) => {
                if snapshotting {
                    self.rollback.mark_committed(&migration_id)?;
                }
                let entry = AuditEntry {
                    migration_id,
                    transformer: transformer.name().to_string(),
                    status: RunStatus::Success,
                    dry_run: options.dry_run,
                    started_at,
                    finished_at: Utc::now(),
                    statistics: outcome.stats,
                    batches: outcome.batches,
                    errors: outcome.errors,
                    warnings: outcome.warnings,
                };
                self.rollback.append_audit(&entry)?;
                info!(
                    migration_id = %entry.migration_id,
                    created = entry.statistics.created,
                    "migration finished"
                );
                Ok(entry)
            }
            Err(err) => {
                let status = if snapshotting {
                    match self.rollback.rollback_migration(&migration_id).await {
                        Ok(true) => RunStatus::RolledBack,
                        Ok(false) => {
                            warn!(%migration_id, "rollback restored only part of the destination");
                            RunStatus::Failed
                        }
                        Err(rollback_err) => {
                            warn!(%migration_id, error = %rollback_err, "rollback failed");
                            RunStatus::Failed
                        }
                    }
                } else {
                    RunStatus::Failed
                };

                // validation and batch failures already logged their detail
                // message by message; anything else is added here
                let mut errors = std::mem::take(&mut outcome.errors);
                match &err {
                    MigrationError::ValidationAborted { .. }
                    | MigrationError::BatchesFailed { .. }
                        if !errors.is_empty() => {}
                    other => errors.push(other.to_string()),
                }
                let entry = AuditEntry {
                    migration_id,
                    transformer: transformer.name().to_string(),
                    status,
                    dry_run: options.dry_run,
                    started_at,
                    finished_at: Utc::now(),
                    statistics: outcome.stats,
                    batches: outcome.batches,
                    errors,
                    warnings: std::mem::take(&mut outcome.warnings),
                };
                if let Err(audit_err) = self.rollback.append_audit(&entry) {
                    warn!(error = %audit_err, "could not append audit entry");
                }
                Err(err)
            }
        }
    }

    /// The unprotected pipeline. Counts accumulate into `outcome` as the run
    /// progresses so the caller sees partial progress even on an error.
    /// Callers that want rollback-on-failure go through
    /// [`safe_run`](Self::safe_run).
    pub async fn run(
        &self,
        transformer: &dyn Transformer,
        dry_run: bool,
        outcome: &mut RunOutcome,
    ) -> Result<(), MigrationError> {
        let mut engine = ValidationEngine::new();
        transformer.register_rules(&mut engine)?;

        let entity = transformer.source_entity();
        let filters = transformer.filters();
        let total = {
            let _timer = self.profiler.start("extract");
            self.source.count(entity, &filters).await?
        };

        if dry_run {
            info!(transformer = transformer.name(), "dry run, writes disabled");
        }

        let policy = RetryPolicy::new(self.config.max_retries, self.config.retry_delay());
        let stop_on_failure = self.config.validation_mode == ValidationMode::Strict
            || self.config.abort_on_failed_batch;
        let target = transformer.target_entity().to_string();
        let mut seen: HashSet<Value> = HashSet::new();

        let mut offset = 0u64;
        let mut index = 0usize;
        while offset < total {
            let page = {
                let _timer = self.profiler.start("extract");
                self.source
                    .fetch(entity, &filters, offset, self.config.batch_size)
                    .await?
            };
            if page.is_empty() {
                break;
            }
            offset += page.len() as u64;
            outcome.stats.extracted += page.len() as u64;

            let survivors = self.validate(transformer, &engine, page, outcome)?;
            let transformed = self.transform(transformer, survivors, outcome);
            let rows = self
                .deduplicate(transformer, transformed, &mut seen, outcome)
                .await?;
            outcome.stats.transformed += rows.len() as u64;
            if rows.is_empty() {
                continue;
            }

            let batch = RecordBatch::new(index, rows);
            index += 1;
            self.persist(transformer, &target, &batch, policy, stop_on_failure, dry_run, outcome)
                .await?;
        }

        // batches that survived their retries still fail the run, after
        // every remaining batch got its chance
        if outcome.batches.failed_batches > 0 {
            return Err(MigrationError::BatchesFailed {
                transformer: transformer.name().to_string(),
                failed: outcome.batches.failed_batches,
            });
        }

        info!(
            transformer = transformer.name(),
            extracted = outcome.stats.extracted,
            created = outcome.stats.created,
            "pipeline finished"
        );
        Ok(())
    }

    /// Applies validation rules and the configured mode to one page.
    /// Records that fail at Error severity never continue: strict aborts
    /// the run, lenient counts them as errored, warning-only counts them
    /// as skipped.
    fn validate(
        &self,
        transformer: &dyn Transformer,
        engine: &ValidationEngine,
        records: Vec<Record>,
        outcome: &mut RunOutcome,
    ) -> Result<Vec<Record>, MigrationError> {
        if !self.config.enable_validation || engine.is_empty() {
            return Ok(records);
        }

        let _timer = self.profiler.start("validate");
        let per_record: Vec<_> = records.iter().map(|r| engine.validate_record(r)).collect();
        let summary = summarize(&per_record);

        for failure in summary.failures() {
            match failure.severity {
                Severity::Error => outcome.errors.push(failure.message.clone()),
                Severity::Warning | Severity::Info => {
                    outcome.warnings.push(failure.message.clone())
                }
            }
        }

        if self.config.validation_mode == ValidationMode::Strict && summary.has_errors() {
            return Err(MigrationError::ValidationAborted {
                transformer: transformer.name().to_string(),
                error_records: summary.error_count,
            });
        }

        let mut survivors = Vec::with_capacity(records.len());
        for (record, results) in records.into_iter().zip(&per_record) {
            let failed = results.iter().any(|r| r.is_failure_at(Severity::Error));
            if !failed {
                survivors.push(record);
            } else {
                match self.config.validation_mode {
                    ValidationMode::Lenient => outcome.stats.errored += 1,
                    ValidationMode::WarningOnly => outcome.stats.skipped += 1,
                    ValidationMode::Strict => unreachable!("strict aborts above"),
                }
            }
        }
        Ok(survivors)
    }

    fn transform(
        &self,
        transformer: &dyn Transformer,
        records: Vec<Record>,
        outcome: &mut RunOutcome,
    ) -> Vec<Record> {
        let _timer = self.profiler.start("transform");
        let mut transformed = Vec::with_capacity(records.len());
        for record in &records {
            match transformer.transform(record) {
                Ok(record) => transformed.push(record),
                Err(err) => {
                    warn!(transformer = transformer.name(), error = %err, "record dropped");
                    outcome.stats.errored += 1;
                    outcome.errors.push(err.to_string());
                }
            }
        }
        transformed
    }

    /// Drops records whose unique field already exists in the destination,
    /// or duplicates a record from an earlier page of this run (`seen`
    /// carries the keys across pages). Null key values pass through
    /// untouched.
    async fn deduplicate(
        &self,
        transformer: &dyn Transformer,
        records: Vec<Record>,
        seen: &mut HashSet<Value>,
        outcome: &mut RunOutcome,
    ) -> Result<Vec<Record>, MigrationError> {
        let Some(field) = transformer.unique_field() else {
            return Ok(records);
        };

        let _timer = self.profiler.start("deduplicate");
        let target = transformer.target_entity();
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            let key = record.get_value(field);
            if key.is_null() {
                kept.push(record);
                continue;
            }
            if seen.contains(&key)
                || self
                    .destination
                    .find_by_field(target, field, &key)
                    .await?
                    .is_some()
            {
                outcome.stats.skipped += 1;
                continue;
            }
            seen.insert(key);
            kept.push(record);
        }
        Ok(kept)
    }

    /// Writes one batch with retry. An exhausted batch is recorded as failed
    /// and the run continues unless `stop_on_failure`; the run-level check
    /// in [`run`](Self::run) turns any failed batch into an error afterward.
    async fn persist(
        &self,
        transformer: &dyn Transformer,
        target: &str,
        batch: &RecordBatch,
        policy: RetryPolicy,
        stop_on_failure: bool,
        dry_run: bool,
        outcome: &mut RunOutcome,
    ) -> Result<(), MigrationError> {
        outcome.batches.total_batches += 1;
        if dry_run {
            return Ok(());
        }

        let _timer = self.profiler.start("persist");
        let result = process_batch(batch, policy, retry_disposition, |b| {
            let destination = Arc::clone(&self.destination);
            let target = target.to_string();
            let rows = b.records.clone();
            async move {
                destination.bulk_insert(&target, &rows).await?;
                Ok::<(), StoreError>(())
            }
        })
        .await;

        match result {
            BatchOutcome::Committed { retries } => {
                outcome.batches.successful_batches += 1;
                if retries > 0 {
                    outcome.batches.retried_batches += 1;
                }
                outcome.stats.created += batch.records.len() as u64;
                Ok(())
            }
            BatchOutcome::Exhausted { error, .. } => {
                outcome.batches.failed_batches += 1;
                outcome.stats.errored += batch.records.len() as u64;
                outcome.errors.push(error.to_string());
                if stop_on_failure {
                    Err(MigrationError::BatchesFailed {
                        transformer: transformer.name().to_string(),
                        failed: outcome.batches.failed_batches,
                    })
                } else {
                    Ok(())
                }
            }
            BatchOutcome::Fatal { error } => {
                outcome.batches.failed_batches += 1;
                outcome.stats.errored += batch.records.len() as u64;
                outcome.errors.push(error.to_string());
                Err(MigrationError::BatchesFailed {
                    transformer: transformer.name().to_string(),
                    failed: outcome.batches.failed_batches,
                })
            }
        }
    }
}

/// Classifies persistence errors for the retry loop. I/O and storage-engine
/// hiccups are worth retrying; schema and encoding problems are not going
/// to fix themselves.
fn retry_disposition(err: &StoreError) -> RetryDisposition {
    match err {
        StoreError::Io(_) | StoreError::Sled(_) | StoreError::Csv(_) | StoreError::Other(_) => {
            RetryDisposition::Retry
        }
        StoreError::Encode(_)
        | StoreError::Decode(_)
        | StoreError::UnknownEntity(_)
        | StoreError::WriteRejected(_) => RetryDisposition::Stop,
    }
}
