use serde::{Deserialize, Serialize};

/// Per-run record counters accumulated by the orchestrator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStats {
    pub extracted: u64,
    pub transformed: u64,
    pub created: u64,
    pub skipped: u64,
    pub errored: u64,
}

impl RunStats {
    pub fn merge(&mut self, other: &RunStats) {
        self.extracted += other.extracted;
        self.transformed += other.transformed;
        self.created += other.created;
        self.skipped += other.skipped;
        self.errored += other.errored;
    }
}

/// Outcome of batch-level retry handling across one run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchStats {
    pub total_batches: u64,
    pub successful_batches: u64,
    pub failed_batches: u64,
    pub retried_batches: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_adds_counters() {
        let mut a = RunStats {
            extracted: 10,
            transformed: 9,
            created: 8,
            skipped: 1,
            errored: 1,
        };
        let b = RunStats {
            extracted: 5,
            transformed: 5,
            created: 5,
            skipped: 0,
            errored: 0,
        };
        a.merge(&b);
        assert_eq!(a.extracted, 15);
        assert_eq!(a.created, 13);
    }
}
