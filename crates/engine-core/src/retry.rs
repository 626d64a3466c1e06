use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Indicates whether an error should be retried or treated as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Result of running an operation under the retry policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The error was considered fatal and should bubble up immediately.
    Fatal(E),
    /// The error was retryable, but the configured attempts were exhausted.
    AttemptsExceeded { error: E, retries: u32 },
}

/// Fixed-delay retry. `max_retries` is the number of additional attempts
/// after the first one, so a batch is tried at most `max_retries + 1` times.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Executes the operation with the configured retry policy. Returns the
    /// successful value together with the number of retries it took.
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        mut op: F,
        classify: Classifier,
    ) -> Result<(T, u32), RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut retries = 0;

        loop {
            match op().await {
                Ok(result) => return Ok((result, retries)),
                Err(err) => match classify(&err) {
                    RetryDisposition::Stop => return Err(RetryError::Fatal(err)),
                    RetryDisposition::Retry => {
                        if retries >= self.max_retries {
                            return Err(RetryError::AttemptsExceeded {
                                error: err,
                                retries,
                            });
                        }
                        sleep(self.delay).await;
                        retries += 1;
                        warn!(
                            attempt = retries,
                            max_retries = self.max_retries,
                            "retrying after transient failure"
                        );
                    }
                },
            }
        }
    }
}
