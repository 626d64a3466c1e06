use crate::{error::StoreError, filter::Filters, store::DataSource};
use async_trait::async_trait;
use model::{core::value::Value, records::record::Record};
use std::path::{Path, PathBuf};

/// Read-only source over a headered CSV file. Each `fetch` re-reads the file
/// from the start, so extraction is restartable per call. Cell values are
/// typed by inference: int, then float, then bool, falling back to string;
/// empty cells become `Null`.
pub struct CsvSource {
    entity: String,
    path: PathBuf,
}

impl CsvSource {
    pub fn new(entity: &str, path: impl AsRef<Path>) -> Self {
        CsvSource {
            entity: entity.to_string(),
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    fn infer_value(cell: &str) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = cell.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = cell.parse::<f64>() {
            return Value::Float(f);
        }
        match cell.to_lowercase().as_str() {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => Value::String(cell.to_string()),
        }
    }

    fn read_rows(&self, filters: &Filters) -> Result<Vec<Record>, StoreError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let row = result?;
            let mut record = Record::new(&self.entity);
            for (i, header) in headers.iter().enumerate() {
                let cell = row.get(i).unwrap_or("").trim();
                record.set(header, Self::infer_value(cell));
            }
            if filters.matches(&record) {
                rows.push(record);
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl DataSource for CsvSource {
    async fn count(&self, entity: &str, filters: &Filters) -> Result<u64, StoreError> {
        if !entity.eq_ignore_ascii_case(&self.entity) {
            return Err(StoreError::UnknownEntity(entity.to_string()));
        }
        Ok(self.read_rows(filters)?.len() as u64)
    }

    async fn fetch(
        &self,
        entity: &str,
        filters: &Filters,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        if !entity.eq_ignore_ascii_case(&self.entity) {
            return Err(StoreError::UnknownEntity(entity.to_string()));
        }
        Ok(self
            .read_rows(filters)?
            .into_iter()
            .skip(offset as usize)
            .take(limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_csv(rows: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,name,score,active").unwrap();
        for i in 0..rows {
            writeln!(file, "{i},row-{i},{}.5,true", i * 2).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn types_are_inferred() {
        let file = sample_csv(1);
        let source = CsvSource::new("scores", file.path());

        let rows = source
            .fetch("scores", &Filters::new(), 0, 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_value("id"), Value::Int(0));
        assert_eq!(rows[0].get_value("name"), Value::from("row-0"));
        assert_eq!(rows[0].get_value("score"), Value::Float(0.5));
        assert_eq!(rows[0].get_value("active"), Value::Boolean(true));
    }

    #[tokio::test]
    async fn pagination_is_restartable() {
        let file = sample_csv(7);
        let source = CsvSource::new("scores", file.path());

        let first = source.fetch("scores", &Filters::new(), 3, 2).await.unwrap();
        let again = source.fetch("scores", &Filters::new(), 3, 2).await.unwrap();
        assert_eq!(first, again);
        assert_eq!(first[0].get_value("id"), Value::Int(3));
    }

    #[tokio::test]
    async fn unknown_entity_is_rejected() {
        let file = sample_csv(1);
        let source = CsvSource::new("scores", file.path());

        let err = source.count("other", &Filters::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownEntity(_)));
    }
}
