use crate::{error::StoreError, filter::Filters};
use async_trait::async_trait;
use model::{core::value::Value, records::record::Record};

/// Read side of a migration: a collection of entities that can be counted
/// and paged through. Implementations must be restartable — two consecutive
/// `fetch` calls at the same offset return the same page when the underlying
/// data has not changed.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn count(&self, entity: &str, filters: &Filters) -> Result<u64, StoreError>;

    /// Offset/limit page of matching rows, in stable source order.
    async fn fetch(
        &self,
        entity: &str,
        filters: &Filters,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError>;
}

/// Write side of a migration. `bulk_insert` and `replace_all` are atomic per
/// call; atomicity across calls is the orchestrator's problem.
#[async_trait]
pub trait DataDestination: Send + Sync {
    /// Appends the given rows in one all-or-nothing step. Returns the number
    /// of rows written.
    async fn bulk_insert(&self, entity: &str, records: &[Record]) -> Result<u64, StoreError>;

    /// Point lookup by field value, used for duplicate detection on reruns.
    async fn find_by_field(
        &self,
        entity: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Record>, StoreError>;

    async fn count_rows(&self, entity: &str) -> Result<u64, StoreError>;

    /// All current rows of the entity, in insertion order. Snapshot input.
    async fn fetch_all(&self, entity: &str) -> Result<Vec<Record>, StoreError>;

    /// Deletes all current rows of the entity and reinserts the given rows
    /// as one atomic step. Rollback building block.
    async fn replace_all(&self, entity: &str, records: &[Record]) -> Result<u64, StoreError>;
}
