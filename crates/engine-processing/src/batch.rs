use engine_core::retry::{RetryDisposition, RetryError, RetryPolicy};
use model::records::batch::RecordBatch;
use std::future::Future;
use tracing::{error, warn};

/// How one batch came out of the retry loop.
#[derive(Debug)]
pub enum BatchOutcome<E> {
    /// Batch committed; `retries` > 0 means extra attempts were needed.
    Committed { retries: u32 },
    /// A retryable error survived every allowed attempt.
    Exhausted { error: E, retries: u32 },
    /// The first error was classified fatal; no retry was attempted.
    Fatal { error: E },
}

impl<E> BatchOutcome<E> {
    pub fn is_committed(&self) -> bool {
        matches!(self, BatchOutcome::Committed { .. })
    }
}

/// Pushes one batch through `process` under the retry policy. Transient
/// errors (per `classify`) are retried with a fixed delay; fatal errors
/// stop immediately. The caller decides whether an exhausted batch ends
/// the run or the next batch is attempted.
pub async fn process_batch<F, Fut, E, C>(
    batch: &RecordBatch,
    policy: RetryPolicy,
    classify: C,
    mut process: F,
) -> BatchOutcome<E>
where
    F: FnMut(&RecordBatch) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
    C: Fn(&E) -> RetryDisposition,
{
    match policy.run(|| process(batch), classify).await {
        Ok(((), retries)) => {
            if retries > 0 {
                warn!(batch = batch.index, retries, "batch succeeded after retry");
            }
            BatchOutcome::Committed { retries }
        }
        Err(RetryError::Fatal(error)) => {
            error!(batch = batch.index, error = %error, "batch failed on a fatal error");
            BatchOutcome::Fatal { error }
        }
        Err(RetryError::AttemptsExceeded { error, retries }) => {
            error!(batch = batch.index, retries, error = %error, "batch failed after retries");
            BatchOutcome::Exhausted { error, retries }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{core::value::Value, records::record::Record};
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    fn batch(n: usize) -> RecordBatch {
        let records = (0..n)
            .map(|i| {
                let mut r = Record::new("t");
                r.set("id", Value::Int(i as i64));
                r
            })
            .collect();
        RecordBatch::new(0, records)
    }

    #[tokio::test]
    async fn transient_failure_is_retried_to_commit() {
        let attempts = AtomicU32::new(0);

        let outcome = process_batch(
            &batch(2),
            RetryPolicy::new(2, Duration::from_millis(0)),
            |_: &&str| RetryDisposition::Retry,
            |_| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move { if n == 0 { Err("transient") } else { Ok(()) } }
            },
        )
        .await;

        assert!(matches!(outcome, BatchOutcome::Committed { retries: 1 }));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_batch_reports_error_and_retries() {
        let outcome = process_batch(
            &batch(1),
            RetryPolicy::new(2, Duration::from_millis(0)),
            |_: &&str| RetryDisposition::Retry,
            |_| async { Err::<(), _>("broken") },
        )
        .await;

        match outcome {
            BatchOutcome::Exhausted { error, retries } => {
                assert_eq!(error, "broken");
                assert_eq!(retries, 2);
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fatal_error_skips_retry() {
        let attempts = AtomicU32::new(0);

        let outcome = process_batch(
            &batch(1),
            RetryPolicy::new(3, Duration::from_millis(0)),
            |_: &&str| RetryDisposition::Stop,
            |_| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("fatal") }
            },
        )
        .await;

        assert!(matches!(outcome, BatchOutcome::Fatal { .. }));
        assert!(!outcome.is_committed());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
