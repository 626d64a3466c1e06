use connectors::filter::Filters;
use engine_processing::{
    error::{RuleBuildError, TransformError},
    validation::engine::ValidationEngine,
};
use model::records::record::Record;

/// One unit of migration: where to read, how to reshape each record, what to
/// validate, and where to write. Implementations are usually built from
/// configuration via [`MappedTransformer`], but hand-written transformers are
/// first-class for anything declarative mappings cannot express.
///
/// [`MappedTransformer`]: crate::mapped::MappedTransformer
pub trait Transformer: Send + Sync {
    fn name(&self) -> &str;

    fn source_entity(&self) -> &str;

    fn target_entity(&self) -> &str;

    /// Entities a run may write to; snapshots cover exactly this set.
    fn affected_entities(&self) -> Vec<String> {
        vec![self.target_entity().to_string()]
    }

    /// Source-side row filter applied during extraction.
    fn filters(&self) -> Filters {
        Filters::new()
    }

    /// Field used for duplicate detection on reruns. `None` disables it.
    fn unique_field(&self) -> Option<&str> {
        None
    }

    /// Registers this transformer's validation rules. Rules run against the
    /// source record, before [`transform`](Self::transform) reshapes it.
    fn register_rules(&self, _engine: &mut ValidationEngine) -> Result<(), RuleBuildError> {
        Ok(())
    }

    /// Reshapes one validated record into its target form.
    fn transform(&self, record: &Record) -> Result<Record, TransformError> {
        Ok(record.clone())
    }
}
