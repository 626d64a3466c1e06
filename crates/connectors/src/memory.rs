use crate::{error::StoreError, filter::Filters, store::{DataDestination, DataSource}};
use async_trait::async_trait;
use model::{core::value::Value, records::record::Record};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// In-memory entity store, insertion ordered. The smallest backend that
/// satisfies both connector traits; used heavily by tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entities: Arc<Mutex<HashMap<String, Vec<Record>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an entity, replacing any existing rows. Test helper.
    pub fn seed(&self, entity: &str, records: Vec<Record>) {
        let mut entities = self.entities.lock().expect("memory store poisoned");
        entities.insert(entity.to_string(), records);
    }

    fn rows(&self, entity: &str) -> Vec<Record> {
        let entities = self.entities.lock().expect("memory store poisoned");
        entities.get(entity).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl DataSource for MemoryStore {
    async fn count(&self, entity: &str, filters: &Filters) -> Result<u64, StoreError> {
        Ok(self
            .rows(entity)
            .iter()
            .filter(|r| filters.matches(r))
            .count() as u64)
    }

    async fn fetch(
        &self,
        entity: &str,
        filters: &Filters,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .rows(entity)
            .into_iter()
            .filter(|r| filters.matches(r))
            .skip(offset as usize)
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl DataDestination for MemoryStore {
    async fn bulk_insert(&self, entity: &str, records: &[Record]) -> Result<u64, StoreError> {
        let mut entities = self.entities.lock().expect("memory store poisoned");
        entities
            .entry(entity.to_string())
            .or_default()
            .extend_from_slice(records);
        Ok(records.len() as u64)
    }

    async fn find_by_field(
        &self,
        entity: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Record>, StoreError> {
        Ok(self
            .rows(entity)
            .into_iter()
            .find(|r| r.get_value(field).equal(value)))
    }

    async fn count_rows(&self, entity: &str) -> Result<u64, StoreError> {
        Ok(self.rows(entity).len() as u64)
    }

    async fn fetch_all(&self, entity: &str) -> Result<Vec<Record>, StoreError> {
        Ok(self.rows(entity))
    }

    async fn replace_all(&self, entity: &str, records: &[Record]) -> Result<u64, StoreError> {
        let mut entities = self.entities.lock().expect("memory store poisoned");
        entities.insert(entity.to_string(), records.to_vec());
        Ok(records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: i64) -> Record {
        Record::with_fields("t", vec![("id", Value::Int(id))])
    }

    #[tokio::test]
    async fn insert_then_paginate() {
        let store = MemoryStore::new();
        store
            .bulk_insert("t", &(1..=5).map(rec).collect::<Vec<_>>())
            .await
            .unwrap();

        assert_eq!(store.count("t", &Filters::new()).await.unwrap(), 5);
        let page = store.fetch("t", &Filters::new(), 3, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].get_value("id"), Value::Int(4));
    }

    #[tokio::test]
    async fn replace_all_swaps_contents() {
        let store = MemoryStore::new();
        store.bulk_insert("t", &[rec(1), rec(2)]).await.unwrap();
        store.replace_all("t", &[rec(9)]).await.unwrap();

        let rows = store.fetch_all("t").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_value("id"), Value::Int(9));
    }

    #[tokio::test]
    async fn find_by_field_point_lookup() {
        let store = MemoryStore::new();
        store.bulk_insert("t", &[rec(1), rec(2)]).await.unwrap();

        let hit = store.find_by_field("t", "id", &Value::Int(2)).await.unwrap();
        assert!(hit.is_some());
        let miss = store.find_by_field("t", "id", &Value::Int(7)).await.unwrap();
        assert!(miss.is_none());
    }
}
