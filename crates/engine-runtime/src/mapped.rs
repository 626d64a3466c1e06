use crate::transformer::Transformer;
use connectors::filter::Filters;
use engine_core::config::{CheckSpec, RuleSpec, TransformerSpec};
use engine_processing::{
    error::{RuleBuildError, TransformError},
    transform::{
        ops::{DefaultValue, ExcludeFields, RenameFields, TrimStrings},
        pipeline::TransformPipeline,
    },
    validation::{engine::ValidationEngine, rules},
};
use model::{core::value::Value, records::record::Record};

/// Transformer driven entirely by a [`TransformerSpec`] from the config
/// file: field renames, exclusions, equality filters and declarative
/// validation checks.
pub struct MappedTransformer {
    spec: TransformerSpec,
    pipeline: TransformPipeline,
}

impl MappedTransformer {
    pub fn from_spec(spec: TransformerSpec) -> Self {
        let mappings: Vec<(String, String)> = spec
            .mappings
            .iter()
            .map(|m| (m.from.clone(), m.to.clone()))
            .collect();

        let mut pipeline = TransformPipeline::new()
            .add_if(!mappings.is_empty(), RenameFields::new(mappings))
            .add_if(
                !spec.exclude_fields.is_empty(),
                ExcludeFields::new(spec.exclude_fields.clone()),
            )
            .add_if(spec.trim_strings, TrimStrings);
        // defaults apply last, on the target field names
        for default in &spec.defaults {
            pipeline = pipeline.add_transform(DefaultValue::new(&default.field, default.value()));
        }

        Self { spec, pipeline }
    }

    fn check_name(check: &CheckSpec) -> &'static str {
        match check {
            CheckSpec::Required => "required",
            CheckSpec::NotEmpty => "not_empty",
            CheckSpec::MinLength { .. } => "min_length",
            CheckSpec::MaxLength { .. } => "max_length",
            CheckSpec::Min { .. } => "min",
            CheckSpec::Max { .. } => "max",
            CheckSpec::OneOf { .. } => "one_of",
            CheckSpec::Pattern { .. } => "pattern",
            CheckSpec::Email => "email",
        }
    }

    fn default_message(rule: &RuleSpec) -> String {
        let field = &rule.field;
        match &rule.check {
            CheckSpec::Required => format!("Field '{field}' is required"),
            CheckSpec::NotEmpty => format!("Field '{field}' must not be empty"),
            CheckSpec::MinLength { value } => {
                format!("Field '{field}' must be at least {value} characters")
            }
            CheckSpec::MaxLength { value } => {
                format!("Field '{field}' must be at most {value} characters")
            }
            CheckSpec::Min { value } => format!("Field '{field}' must be >= {value}"),
            CheckSpec::Max { value } => format!("Field '{field}' must be <= {value}"),
            CheckSpec::OneOf { values } => {
                format!("Field '{field}' must be one of: {}", values.join(", "))
            }
            CheckSpec::Pattern { regex } => {
                format!("Field '{field}' must match pattern '{regex}'")
            }
            CheckSpec::Email => format!("Field '{field}' must be a valid email address"),
        }
    }

    fn register_rule(
        engine: &mut ValidationEngine,
        rule: &RuleSpec,
    ) -> Result<(), RuleBuildError> {
        let name = Self::check_name(&rule.check);
        let message = rule
            .message
            .clone()
            .unwrap_or_else(|| Self::default_message(rule));
        let field = rule.field.as_str();
        let severity = rule.severity;

        match &rule.check {
            CheckSpec::Required => {
                engine.add_value_rule(field, name, severity, &message, rules::required());
            }
            CheckSpec::NotEmpty => {
                engine.add_value_rule(field, name, severity, &message, rules::not_empty());
            }
            CheckSpec::MinLength { value } => {
                engine.add_value_rule(field, name, severity, &message, rules::min_length(*value));
            }
            CheckSpec::MaxLength { value } => {
                engine.add_value_rule(field, name, severity, &message, rules::max_length(*value));
            }
            CheckSpec::Min { value } => {
                engine.add_value_rule(field, name, severity, &message, rules::min(*value));
            }
            CheckSpec::Max { value } => {
                engine.add_value_rule(field, name, severity, &message, rules::max(*value));
            }
            CheckSpec::OneOf { values } => {
                let allowed = values.iter().map(|v| Value::from(v.as_str())).collect();
                engine.add_value_rule(field, name, severity, &message, rules::one_of(allowed));
            }
            CheckSpec::Pattern { regex } => {
                let predicate = rules::matches_pattern(field, regex)?;
                engine.add_value_rule(field, name, severity, &message, predicate);
            }
            CheckSpec::Email => {
                engine.add_value_rule(field, name, severity, &message, rules::email());
            }
        }
        Ok(())
    }
}

impl Transformer for MappedTransformer {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn source_entity(&self) -> &str {
        &self.spec.source_entity
    }

    fn target_entity(&self) -> &str {
        &self.spec.target_entity
    }

    fn filters(&self) -> Filters {
        self.spec
            .filters
            .iter()
            .fold(Filters::new(), |filters, f| {
                filters.eq(&f.field, f.value())
            })
    }

    fn unique_field(&self) -> Option<&str> {
        self.spec.unique_field.as_deref()
    }

    fn register_rules(&self, engine: &mut ValidationEngine) -> Result<(), RuleBuildError> {
        for rule in &self.spec.rules {
            Self::register_rule(engine, rule)?;
        }
        Ok(())
    }

    fn transform(&self, record: &Record) -> Result<Record, TransformError> {
        self.pipeline.apply(record)
    }
}
