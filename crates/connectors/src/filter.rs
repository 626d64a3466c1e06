use model::{core::value::Value, records::record::Record};

/// Equality conditions applied on the source side before pagination.
/// Condition order is preserved for deterministic log output.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    conditions: Vec<(String, Value)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| record.get_value(field).equal(value))
    }
}
