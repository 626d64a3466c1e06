use crate::{error::TransformError, transform::pipeline::Transform};
use model::{core::value::Value, records::record::Record};

/// Renames source fields to their target names. Missing source fields are
/// left alone; downstream validation decides whether that matters.
pub struct RenameFields {
    mappings: Vec<(String, String)>,
}

impl RenameFields {
    pub fn new(mappings: Vec<(String, String)>) -> Self {
        Self { mappings }
    }
}

impl Transform for RenameFields {
    fn apply(&self, record: &Record) -> Result<Record, TransformError> {
        let mut record = record.clone();
        for (from, to) in &self.mappings {
            record.rename(from, to);
        }
        Ok(record)
    }
}

pub struct ExcludeFields {
    fields: Vec<String>,
}

impl ExcludeFields {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl Transform for ExcludeFields {
    fn apply(&self, record: &Record) -> Result<Record, TransformError> {
        let mut record = record.clone();
        for field in &self.fields {
            record.remove(field);
        }
        Ok(record)
    }
}

/// Trims surrounding whitespace from every string field.
pub struct TrimStrings;

impl Transform for TrimStrings {
    fn apply(&self, record: &Record) -> Result<Record, TransformError> {
        let mut record = record.clone();
        for field in &mut record.fields {
            if let Value::String(s) = &field.value {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    field.value = Value::String(trimmed.to_string());
                }
            }
        }
        Ok(record)
    }
}

/// Fills a field with a fallback when it is absent or null.
pub struct DefaultValue {
    field: String,
    value: Value,
}

impl DefaultValue {
    pub fn new(field: &str, value: Value) -> Self {
        Self {
            field: field.to_string(),
            value,
        }
    }
}

impl Transform for DefaultValue {
    fn apply(&self, record: &Record) -> Result<Record, TransformError> {
        let mut record = record.clone();
        if record.get_value(&self.field).is_null() {
            record.set(&self.field, self.value.clone());
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(fields: &[(&str, Value)]) -> Record {
        let mut record = Record::new("t");
        for (name, value) in fields {
            record.set(name, value.clone());
        }
        record
    }

    #[test]
    fn rename_preserves_values_and_order() {
        let record = rec(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
        let out = RenameFields::new(vec![("a".into(), "alpha".into())])
            .apply(&record)
            .unwrap();
        assert_eq!(out.field_names(), vec!["alpha", "b"]);
        assert_eq!(out.get_value("alpha"), Value::Int(1));
    }

    #[test]
    fn rename_ignores_missing_source_field() {
        let record = rec(&[("a", Value::Int(1))]);
        let out = RenameFields::new(vec![("ghost".into(), "g".into())])
            .apply(&record)
            .unwrap();
        assert_eq!(out, record);
    }

    #[test]
    fn exclude_drops_named_fields_only() {
        let record = rec(&[("keep", Value::Int(1)), ("drop", Value::Int(2))]);
        let out = ExcludeFields::new(vec!["drop".into()]).apply(&record).unwrap();
        assert!(out.has_field("keep"));
        assert!(!out.has_field("drop"));
    }

    #[test]
    fn trim_touches_only_strings() {
        let record = rec(&[("s", Value::from("  hi  ")), ("n", Value::Int(3))]);
        let out = TrimStrings.apply(&record).unwrap();
        assert_eq!(out.get_value("s"), Value::from("hi"));
        assert_eq!(out.get_value("n"), Value::Int(3));
    }

    #[test]
    fn default_fills_null_and_missing_but_not_present() {
        let record = rec(&[("a", Value::Null), ("b", Value::Int(5))]);
        let op = DefaultValue::new("a", Value::Int(0));
        let out = op.apply(&record).unwrap();
        assert_eq!(out.get_value("a"), Value::Int(0));

        let out = DefaultValue::new("b", Value::Int(0)).apply(&record).unwrap();
        assert_eq!(out.get_value("b"), Value::Int(5));

        let out = DefaultValue::new("c", Value::from("x")).apply(&record).unwrap();
        assert_eq!(out.get_value("c"), Value::from("x"));
    }
}
