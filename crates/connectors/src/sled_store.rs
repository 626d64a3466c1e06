use crate::{error::StoreError, filter::Filters, store::{DataDestination, DataSource}};
use async_trait::async_trait;
use model::{core::value::Value, records::record::Record};
use sled::transaction::TransactionError;
use std::path::Path;
use tracing::debug;

/// Sled-backed entity store. Rows live under `row:{entity}:{seq}` with a
/// zero-padded sequence so the lexicographic prefix scan preserves insertion
/// order; a `seq:{entity}` counter hands out the next sequence number.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    #[inline]
    fn row_key(entity: &str, seq: u64) -> String {
        format!("row:{entity}:{seq:020}")
    }

    #[inline]
    fn seq_key(entity: &str) -> String {
        format!("seq:{entity}")
    }

    fn row_prefix(entity: &str) -> String {
        format!("row:{entity}:")
    }

    fn decode(bytes: &[u8]) -> Result<Record, StoreError> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn encode_batch(records: &[Record]) -> Result<Vec<Vec<u8>>, StoreError> {
        records
            .iter()
            .map(|r| bincode::serialize(r).map_err(|e| StoreError::Encode(e.to_string())))
            .collect()
    }

    fn scan_rows(&self, entity: &str) -> Result<Vec<Record>, StoreError> {
        let mut rows = Vec::new();
        for item in self.db.scan_prefix(Self::row_prefix(entity)) {
            let (_key, value) = item?;
            rows.push(Self::decode(&value)?);
        }
        Ok(rows)
    }

    fn map_tx_err(err: TransactionError<StoreError>) -> StoreError {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StoreError::Sled(e),
        }
    }
}

#[async_trait]
impl DataSource for SledStore {
    async fn count(&self, entity: &str, filters: &Filters) -> Result<u64, StoreError> {
        Ok(self
            .scan_rows(entity)?
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
            .scan_rows(entity)?
            .into_iter()
            .filter(|r| filters.matches(r))
            .skip(offset as usize)
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl DataDestination for SledStore {
    async fn bulk_insert(&self, entity: &str, records: &[Record]) -> Result<u64, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let encoded = Self::encode_batch(records)?;
        let seq_key = Self::seq_key(entity);
        let entity = entity.to_string();

        self.db
            .transaction::<_, _, StoreError>(|tx| {
                let start = match tx.get(&seq_key)? {
                    Some(bytes) => {
                        let mut buf = [0u8; 8];
                        buf.copy_from_slice(&bytes);
                        u64::from_be_bytes(buf)
                    }
                    None => 0,
                };

                for (i, bytes) in encoded.iter().enumerate() {
                    let key = Self::row_key(&entity, start + i as u64);
                    tx.insert(key.as_bytes(), bytes.as_slice())?;
                }

                let next = start + encoded.len() as u64;
                tx.insert(seq_key.as_bytes(), &next.to_be_bytes())?;
                Ok(())
            })
            .map_err(Self::map_tx_err)?;

        self.db.flush_async().await?;
        debug!(entity = %entity, rows = records.len(), "batch written");
        Ok(records.len() as u64)
    }

    async fn find_by_field(
        &self,
        entity: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Record>, StoreError> {
        for item in self.db.scan_prefix(Self::row_prefix(entity)) {
            let (_key, bytes) = item?;
            let record = Self::decode(&bytes)?;
            if record.get_value(field).equal(value) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    async fn count_rows(&self, entity: &str) -> Result<u64, StoreError> {
        Ok(self.db.scan_prefix(Self::row_prefix(entity)).count() as u64)
    }

    async fn fetch_all(&self, entity: &str) -> Result<Vec<Record>, StoreError> {
        self.scan_rows(entity)
    }

    async fn replace_all(&self, entity: &str, records: &[Record]) -> Result<u64, StoreError> {
        // Keys are collected outside the transaction; the store assumes a
        // single writer per entity during restore.
        let mut old_keys = Vec::new();
        for item in self.db.scan_prefix(Self::row_prefix(entity)) {
            let (key, _value) = item?;
            old_keys.push(key);
        }

        let encoded = Self::encode_batch(records)?;
        let seq_key = Self::seq_key(entity);
        let entity = entity.to_string();

        self.db
            .transaction::<_, _, StoreError>(|tx| {
                for key in &old_keys {
                    tx.remove(key.as_ref())?;
                }
                for (i, bytes) in encoded.iter().enumerate() {
                    let key = Self::row_key(&entity, i as u64);
                    tx.insert(key.as_bytes(), bytes.as_slice())?;
                }
                let next = encoded.len() as u64;
                tx.insert(seq_key.as_bytes(), &next.to_be_bytes())?;
                Ok(())
            })
            .map_err(Self::map_tx_err)?;

        self.db.flush_async().await?;
        debug!(
            entity = %entity,
            removed = old_keys.len(),
            restored = records.len(),
            "entity replaced"
        );
        Ok(records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rec(id: i64, name: &str) -> Record {
        Record::with_fields(
            "actor",
            vec![("id", Value::Int(id)), ("name", Value::from(name))],
        )
    }

    #[tokio::test]
    async fn insert_preserves_order_across_batches() {
        let dir = tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();

        store
            .bulk_insert("actor", &[rec(1, "a"), rec(2, "b")])
            .await
            .unwrap();
        store.bulk_insert("actor", &[rec(3, "c")]).await.unwrap();

        let rows = store.fetch_all("actor").await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.get_value("id")).collect();
        assert_eq!(ids, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[tokio::test]
    async fn replace_all_restores_exact_rows() {
        let dir = tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();

        store
            .bulk_insert("actor", &[rec(1, "a"), rec(2, "b")])
            .await
            .unwrap();
        let before = store.fetch_all("actor").await.unwrap();

        store.bulk_insert("actor", &[rec(3, "c")]).await.unwrap();
        store.replace_all("actor", &before).await.unwrap();

        let after = store.fetch_all("actor").await.unwrap();
        assert_eq!(after, before);
        assert_eq!(store.count_rows("actor").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn entities_are_isolated() {
        let dir = tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();

        store.bulk_insert("actor", &[rec(1, "a")]).await.unwrap();
        store.bulk_insert("film", &[rec(10, "x")]).await.unwrap();

        assert_eq!(store.count_rows("actor").await.unwrap(), 1);
        assert_eq!(store.count_rows("film").await.unwrap(), 1);
        let hit = store
            .find_by_field("film", "id", &Value::Int(10))
            .await
            .unwrap();
        assert!(hit.is_some());
    }
}
