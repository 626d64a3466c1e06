use model::{core::value::Value, validation::severity::Severity};
use serde::{Deserialize, Serialize};

/// Outcome of evaluating one rule against one record. Passing rules are
/// reported too, so callers can audit what was checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub field: String,
    pub value: Value,
    pub is_valid: bool,
    pub severity: Severity,
    pub message: String,
    pub rule_name: String,
}

impl ValidationResult {
    pub fn is_failure_at(&self, severity: Severity) -> bool {
        !self.is_valid && self.severity == severity
    }
}

/// Aggregate over one batch. A record with at least one failing rule counts
/// exactly once in `invalid_count`; the per-severity counts each count a
/// record once per severity it failed at, so a record failing an Error and
/// a Warning rule shows up in both `error_count` and `warning_count`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchValidationSummary {
    pub total: u64,
    pub valid_count: u64,
    pub invalid_count: u64,
    pub error_count: u64,
    pub warning_count: u64,
    pub info_count: u64,
    pub results: Vec<ValidationResult>,
}

impl BatchValidationSummary {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.is_valid)
    }
}
