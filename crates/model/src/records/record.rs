use crate::core::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

/// One row pulled from a source entity. Field order is preserved so that
/// serialized snapshots restore byte-identical rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub entity: String,
    pub fields: Vec<FieldValue>,
}

impl Record {
    pub fn new(entity: &str) -> Self {
        Record {
            entity: entity.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(entity: &str, fields: Vec<(&str, Value)>) -> Self {
        Record {
            entity: entity.to_string(),
            fields: fields
                .into_iter()
                .map(|(name, value)| FieldValue {
                    name: name.to_string(),
                    value,
                })
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    /// Field value by name, `Value::Null` when the field is absent.
    pub fn get_value(&self, field: &str) -> Value {
        self.get(field).map(|f| f.value.clone()).unwrap_or(Value::Null)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Sets or replaces a field, keeping the original position on replace.
    pub fn set(&mut self, field: &str, value: Value) {
        match self
            .fields
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(field))
        {
            Some(existing) => existing.value = value,
            None => self.fields.push(FieldValue {
                name: field.to_string(),
                value,
            }),
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        let idx = self
            .fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(field))?;
        Some(self.fields.remove(idx).value)
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(f) = self
            .fields
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(from))
        {
            f.name = to.to_string();
        }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}
