use crate::error::TransformError;
use model::records::record::Record;

/// A single record-shaping step. Steps are fallible: a failed step marks the
/// record as errored without touching the rest of the batch.
pub trait Transform: Send + Sync {
    fn apply(&self, record: &Record) -> Result<Record, TransformError>;
}

/// Blanket impl so simple steps can be written as plain closures.
impl<F> Transform for F
where
    F: Fn(&Record) -> Result<Record, TransformError> + Send + Sync,
{
    fn apply(&self, record: &Record) -> Result<Record, TransformError> {
        self(record)
    }
}

#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    pub fn add_transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Conditionally appends a step; keeps builder chains readable when a
    /// step depends on configuration.
    pub fn add_if<T: Transform + 'static>(self, condition: bool, transform: T) -> Self {
        if condition {
            self.add_transform(transform)
        } else {
            self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn apply(&self, record: &Record) -> Result<Record, TransformError> {
        self.transforms
            .iter()
            .try_fold(record.clone(), |acc, transform| transform.apply(&acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::ops::{DefaultValue, RenameFields};
    use model::core::value::Value;

    #[test]
    fn steps_run_in_registration_order() {
        let pipeline = TransformPipeline::new()
            .add_transform(RenameFields::new(vec![("old".into(), "new".into())]))
            .add_transform(DefaultValue::new("new", Value::Int(0)));

        let mut record = Record::new("t");
        record.set("old", Value::Null);
        let out = pipeline.apply(&record).unwrap();

        assert!(!out.has_field("old"));
        assert_eq!(out.get_value("new"), Value::Int(0));
    }

    #[test]
    fn failing_step_short_circuits() {
        let pipeline = TransformPipeline::new()
            .add_transform(|_: &Record| -> Result<Record, TransformError> {
                Err(TransformError::Transformation("boom".into()))
            })
            .add_transform(DefaultValue::new("x", Value::Int(1)));

        assert!(pipeline.apply(&Record::new("t")).is_err());
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let pipeline = TransformPipeline::new();
        let mut record = Record::new("t");
        record.set("a", Value::from("v"));
        assert_eq!(pipeline.apply(&record).unwrap(), record);
    }
}
