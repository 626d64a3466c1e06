use crate::error::CliError;
use engine_core::state::models::SnapshotMeta;
use model::run::audit::AuditEntry;

pub fn print_run_reports(entries: &[AuditEntry], as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    for entry in entries {
        println!(
            "{:<24} {:<12} extracted={} created={} skipped={} errored={} ({:.2}s)",
            entry.transformer,
            entry.status.to_string(),
            entry.statistics.extracted,
            entry.statistics.created,
            entry.statistics.skipped,
            entry.statistics.errored,
            entry.duration_seconds(),
        );
        for warning in &entry.warnings {
            println!("  warning: {warning}");
        }
        for error in &entry.errors {
            println!("  error: {error}");
        }
    }
    Ok(())
}

pub fn print_snapshots(snapshots: &[SnapshotMeta]) {
    if snapshots.is_empty() {
        println!("No snapshots.");
        return;
    }
    println!(
        "{:<48} {:<20} {:<12} {}",
        "MIGRATION ID", "CREATED", "STAGE", "ENTITIES"
    );
    for meta in snapshots {
        let entities: Vec<String> = meta
            .entities
            .iter()
            .map(|e| format!("{} ({} rows)", e.entity, e.row_count))
            .collect();
        println!(
            "{:<48} {:<20} {:<12} {}",
            meta.migration_id,
            meta.created_at.format("%Y-%m-%d %H:%M:%S"),
            format!("{:?}", meta.stage).to_lowercase(),
            entities.join(", ")
        );
    }
}

pub fn print_history(entries: &[AuditEntry], as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }
    println!(
        "{:<48} {:<20} {:<12} {:<8} CREATED/ERRORED",
        "MIGRATION ID", "STARTED", "STATUS", "DRY RUN"
    );
    for entry in entries {
        println!(
            "{:<48} {:<20} {:<12} {:<8} {}/{}",
            entry.migration_id,
            entry.started_at.format("%Y-%m-%d %H:%M:%S"),
            entry.status.to_string(),
            if entry.dry_run { "yes" } else { "no" },
            entry.statistics.created,
            entry.statistics.errored,
        );
    }
    Ok(())
}
