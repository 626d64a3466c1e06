use crate::records::record::Record;

/// One extraction page. Batches are processed strictly in `index` order
/// within a run and discarded after persistence.
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub index: usize,
    pub records: Vec<Record>,
}

impl RecordBatch {
    pub fn new(index: usize, records: Vec<Record>) -> Self {
        RecordBatch { index, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
