use crate::{error::ConfigError, profiler::ProfilerThresholds};
use model::{core::value::Value, validation::severity::{Severity, ValidationMode}};
use serde::{Deserialize, Serialize};
use std::{path::{Path, PathBuf}, time::Duration};

/// Batch-processing knobs. Defaults mirror the documented contract:
/// batch_size=1000, max_retries=3, retry_delay=5s, strict validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformationConfig {
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub enable_validation: bool,
    pub validation_mode: ValidationMode,
    pub abort_on_failed_batch: bool,
}

impl Default for TransformationConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_retries: 3,
            retry_delay_secs: 5,
            enable_validation: true,
            validation_mode: ValidationMode::Strict,
            abort_on_failed_batch: false,
        }
    }
}

impl TransformationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackConfig {
    pub enabled: bool,
    pub backup_directory: PathBuf,
    pub retention_days: u32,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backup_directory: PathBuf::from(".transfuse/backups"),
            retention_days: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Csv,
    Sled,
    Memory,
}

/// One named data endpoint. `path` is the CSV file or sled directory;
/// `entity` names the collection a CSV file holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub kind: EndpointKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub entity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsConfig {
    pub source: EndpointConfig,
    pub target: EndpointConfig,
}

/// Declarative per-field validation check, constructed into an engine rule
/// by the runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum CheckSpec {
    Required,
    NotEmpty,
    MinLength { value: usize },
    MaxLength { value: usize },
    Min { value: f64 },
    Max { value: f64 },
    OneOf { values: Vec<String> },
    Pattern { regex: String },
    Email,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub field: String,
    #[serde(flatten)]
    pub check: CheckSpec,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_severity() -> Severity {
    Severity::Error
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSpec {
    pub field: String,
    pub equals: serde_json::Value,
}

impl FilterSpec {
    pub fn value(&self) -> Value {
        json_to_value(&self.equals)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingSpec {
    pub from: String,
    pub to: String,
}

/// Fallback value for a field that arrives absent or null. The field name
/// refers to the record after mappings and exclusions applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultSpec {
    pub field: String,
    pub value: serde_json::Value,
}

impl DefaultSpec {
    pub fn value(&self) -> Value {
        json_to_value(&self.value)
    }
}

/// Declarative transformer definition driven from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerSpec {
    pub name: String,
    pub source_entity: String,
    pub target_entity: String,
    #[serde(default)]
    pub unique_field: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub mappings: Vec<MappingSpec>,
    #[serde(default)]
    pub exclude_fields: Vec<String>,
    /// Strip surrounding whitespace from every string field.
    #[serde(default)]
    pub trim_strings: bool,
    #[serde(default)]
    pub defaults: Vec<DefaultSpec>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EtlConfig {
    pub transformation: TransformationConfig,
    pub profiler: ProfilerThresholds,
    pub rollback: RollbackConfig,
    pub connections: Option<ConnectionsConfig>,
    pub transformers: Vec<TransformerSpec>,
}

impl EtlConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: EtlConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transformation.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be > 0".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for spec in &self.transformers {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate transformer name '{}'",
                    spec.name
                )));
            }
        }

        if let Some(conns) = &self.connections {
            for (role, endpoint) in [("source", &conns.source), ("target", &conns.target)] {
                if endpoint.kind != EndpointKind::Memory && endpoint.path.is_none() {
                    return Err(ConfigError::Invalid(format!(
                        "{role} endpoint of kind {:?} requires a path",
                        endpoint.kind
                    )));
                }
            }
        }

        Ok(())
    }
}

pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        other => Value::Json(other.clone()),
    }
}
