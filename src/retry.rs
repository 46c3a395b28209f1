//! Retry policy wrapped around one logical operation.

use rand::Rng;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
pub const DEFAULT_DELTA_BACKOFF: Duration = Duration::from_secs(2);

/// Decides whether an error is worth another attempt.
pub type RetryClassifier = Arc<dyn Fn(&StorageError) -> bool + Send + Sync>;

/// Wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Wait the same amount before every retry.
    Fixed(Duration),
    /// `min + (2^(n-1) - 1) * delta * jitter`, capped at `max`, where `n` is
    /// the retry number and jitter is drawn from 0.8..=1.2.
    Exponential {
        min: Duration,
        max: Duration,
        delta: Duration,
    },
}

impl Backoff {
    /// Delay before retry number `retry` (1 for the first retry).
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { min, max, delta } => {
                let exponent = retry.saturating_sub(1).min(62) as i32;
                let factor = 2f64.powi(exponent) - 1.0;
                let jitter = rand::thread_rng().gen_range(0.8..=1.2);
                let secs = min.as_secs_f64() + factor * delta.as_secs_f64() * jitter;

                Duration::try_from_secs_f64(secs)
                    .unwrap_or(max)
                    .min(max)
            }
        }
    }
}

/// How many times to retry, how long to wait, and which errors qualify.
///
/// The default treats every error as transient and backs off exponentially.
#[derive(Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Backoff,
    classifier: RetryClassifier,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
            classifier: Arc::new(|_| true),
        }
    }

    /// A single attempt, errors propagate as-is.
    pub fn no_retry() -> Self {
        Self::new(0, Backoff::None)
    }

    /// Exponential backoff with the default bounds.
    pub fn exponential(max_retries: u32) -> Self {
        Self::new(
            max_retries,
            Backoff::Exponential {
                min: DEFAULT_MIN_BACKOFF,
                max: DEFAULT_MAX_BACKOFF,
                delta: DEFAULT_DELTA_BACKOFF,
            },
        )
    }

    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self::new(max_retries, Backoff::Fixed(delay))
    }

    /// Replaces the transience check, e.g. to retry only throttling.
    pub fn with_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&StorageError) -> bool + Send + Sync + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    pub fn is_transient(&self, err: &StorageError) -> bool {
        (self.classifier)(err)
    }

    /// Runs `attempt` until it succeeds, the error is not transient, or the
    /// retries are used up. Attempts are strictly sequential.
    ///
    /// Returns the value with the number of attempts made. A failure after
    /// a single attempt is returned unchanged; a failure after more than one
    /// is wrapped in [`StorageError::Retried`].
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> StorageResult<(T, u32)>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let err = match attempt(attempts).await {
                Ok(value) => return Ok((value, attempts)),
                Err(err) => err,
            };

            if attempts <= self.max_retries && self.is_transient(&err) {
                let delay = self.backoff.delay(attempts);
                warn!(
                    "Attempt {} failed, retrying in {:?}: {}",
                    attempts, delay, err
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            debug!("Giving up after {} attempt(s): {}", attempts, err);

            return Err(if attempts > 1 {
                StorageError::Retried {
                    attempts,
                    source: Box::new(err),
                }
            } else {
                err
            });
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_MAX_RETRIES)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}
