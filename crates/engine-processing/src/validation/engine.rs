use crate::validation::result::{BatchValidationSummary, ValidationResult};
use model::{core::value::Value, records::record::Record, validation::severity::Severity};
use std::sync::Arc;
use tracing::debug;

/// A predicate may fail to evaluate (`Err`); the engine treats that as a
/// failed validation at Error severity rather than propagating.
pub type RulePredicate = Arc<dyn Fn(&Record) -> Result<bool, String> + Send + Sync>;

#[derive(Clone)]
pub struct ValidationRule {
    pub field: String,
    pub name: String,
    pub severity: Severity,
    pub message: String,
    predicate: RulePredicate,
}

/// Ordered collection of user-declared rules, owned by one transformer run.
/// Rules are immutable once registered; `validate_*` never returns an error.
#[derive(Clone, Default)]
pub struct ValidationEngine {
    rules: Vec<ValidationRule>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(
        &mut self,
        field: &str,
        name: &str,
        severity: Severity,
        message: &str,
        predicate: RulePredicate,
    ) {
        self.rules.push(ValidationRule {
            field: field.to_string(),
            name: name.to_string(),
            severity,
            message: message.to_string(),
            predicate,
        });
    }

    /// Registers a rule over a single field's value. Missing fields are
    /// evaluated as `Null`, so `rules::required` catches absence too.
    pub fn add_value_rule<F>(
        &mut self,
        field: &str,
        name: &str,
        severity: Severity,
        message: &str,
        predicate: F,
    ) where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let field_name = field.to_string();
        self.add_rule(
            field,
            name,
            severity,
            message,
            Arc::new(move |record| Ok(predicate(&record.get_value(&field_name)))),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluates every registered rule, returning one result per rule —
    /// passes included, so callers can audit what was checked.
    pub fn validate_record(&self, record: &Record) -> Vec<ValidationResult> {
        self.rules
            .iter()
            .map(|rule| {
                let value = record.get_value(&rule.field);
                match (rule.predicate)(record) {
                    Ok(is_valid) => ValidationResult {
                        field: rule.field.clone(),
                        value,
                        is_valid,
                        severity: rule.severity,
                        message: rule.message.clone(),
                        rule_name: rule.name.clone(),
                    },
                    Err(err) => {
                        debug!(rule = %rule.name, field = %rule.field, error = %err, "rule predicate failed to evaluate");
                        ValidationResult {
                            field: rule.field.clone(),
                            value,
                            is_valid: false,
                            severity: Severity::Error,
                            message: format!("Rule '{}' failed to evaluate: {err}", rule.name),
                            rule_name: rule.name.clone(),
                        }
                    }
                }
            })
            .collect()
    }

    pub fn validate_batch(&self, records: &[Record]) -> BatchValidationSummary {
        let per_record: Vec<Vec<ValidationResult>> = records
            .iter()
            .map(|record| self.validate_record(record))
            .collect();
        summarize(&per_record)
    }
}

/// Aggregates per-record results into a batch summary. Kept public so the
/// orchestrator can validate record-by-record (it needs per-record verdicts
/// for the persistence decision) without evaluating rules twice.
pub fn summarize(per_record: &[Vec<ValidationResult>]) -> BatchValidationSummary {
    let mut summary = BatchValidationSummary {
        total: per_record.len() as u64,
        ..Default::default()
    };

    for results in per_record {
        let failed_error = results.iter().any(|r| r.is_failure_at(Severity::Error));
        let failed_warning = results.iter().any(|r| r.is_failure_at(Severity::Warning));
        let failed_info = results.iter().any(|r| r.is_failure_at(Severity::Info));

        if failed_error {
            summary.error_count += 1;
        }
        if failed_warning {
            summary.warning_count += 1;
        }
        if failed_info {
            summary.info_count += 1;
        }
        if failed_error || failed_warning || failed_info {
            summary.invalid_count += 1;
        } else {
            summary.valid_count += 1;
        }

        summary.results.extend(results.iter().cloned());
    }

    summary
}
