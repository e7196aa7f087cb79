//! Retry policy for the per-target pipeline.
//!
//! [`retry_with_backoff`] re-runs a whole pipeline attempt on transient
//! errors. Non-retriable errors end the target immediately. Cancellation
//! interrupts a back-off sleep but never an attempt in flight.

use std::future::Future;
use std::time::Duration;

use slotwatch_core::{AppConfig, BackoffStrategy};
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;

const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);
const DEFAULT_MAX_RETRIES: u32 = 3;
const MAX_EXPONENTIAL_DELAY: Duration = Duration::from_secs(60);

/// Delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `base × 2^(retry-1)` capped at `cap`, with ±25 % jitter.
    Exponential { base: Duration, cap: Duration },
}

impl Backoff {
    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, cap } => {
                let factor = 1u32 << retry.saturating_sub(1).min(20);
                let capped = base.saturating_mul(factor).min(cap);
                capped.mul_f64(rand::random::<f64>() * 0.5 + 0.75)
            }
        }
    }
}

/// How often and how patiently a failing target is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `None` retries until success or
    /// cancellation.
    pub max_retries: Option<u32>,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    /// Three retries, two seconds apart.
    fn default() -> Self {
        Self {
            max_retries: Some(DEFAULT_MAX_RETRIES),
            backoff: Backoff::Fixed(DEFAULT_BACKOFF),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn bounded(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries: Some(max_retries),
            backoff,
        }
    }

    #[must_use]
    pub fn unbounded(backoff: Backoff) -> Self {
        Self {
            max_retries: None,
            backoff,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let base = Duration::from_millis(config.retry_backoff_ms);
        let backoff = match config.retry_backoff {
            BackoffStrategy::Fixed => Backoff::Fixed(base),
            BackoffStrategy::Exponential => Backoff::Exponential {
                base,
                cap: MAX_EXPONENTIAL_DELAY,
            },
        };
        Self {
            max_retries: config.max_retries,
            backoff,
        }
    }

    /// Whether another attempt is allowed after `failed_attempts` failures.
    #[must_use]
    pub fn allows_retry(&self, failed_attempts: u32) -> bool {
        self.max_retries.is_none_or(|max| failed_attempts <= max)
    }
}

/// Why [`retry_with_backoff`] gave up.
#[derive(Debug)]
pub enum RetryError {
    /// Non-retriable error, or retries exhausted
    /// ([`PipelineError::RetriesExhausted`]).
    Fatal(PipelineError),
    /// Cancelled while waiting to retry; carries the last transient error.
    Interrupted(PipelineError),
}

/// Runs `operation` until it succeeds, fails non-retriably, runs out of
/// retries, or `cancel` fires during a back-off.
///
/// With `max_retries = Some(3)` the operation runs at most 4 times.
///
/// # Errors
///
/// See [`RetryError`].
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retriable() {
            return Err(RetryError::Fatal(err));
        }
        if !policy.allows_retry(attempt) {
            return Err(RetryError::Fatal(PipelineError::RetriesExhausted {
                attempts: attempt,
                last: Box::new(err),
            }));
        }

        let delay = policy.backoff.delay_for(attempt);
        tracing::warn!(
            attempt,
            max_retries = ?policy.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient failure; retrying after back-off"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RetryError::Interrupted(err)),
            () = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use slotwatch_scraper::{ExtractionError, TransportError};

    use super::*;

    fn status_503() -> PipelineError {
        PipelineError::HttpStatus {
            status: 503,
            url: "https://example.com".to_owned(),
        }
    }

    fn fixed() -> Backoff {
        Backoff::Fixed(Duration::from_secs(2))
    }

    #[test]
    fn default_policy_is_three_retries_two_seconds_apart() {
        assert_eq!(
            RetryPolicy::default(),
            RetryPolicy::bounded(3, Backoff::Fixed(Duration::from_secs(2)))
        );
    }

    #[test]
    fn allows_retry_counts_failed_attempts() {
        let policy = RetryPolicy::bounded(2, fixed());
        assert!(policy.allows_retry(1));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
        assert!(RetryPolicy::unbounded(fixed()).allows_retry(u32::MAX));
    }

    #[test]
    fn exponential_delay_grows_and_is_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(1_000),
            cap: Duration::from_secs(60),
        };
        let first = backoff.delay_for(1);
        assert!(first >= Duration::from_millis(750) && first <= Duration::from_millis(1_250));
        let third = backoff.delay_for(3);
        assert!(third >= Duration::from_millis(3_000) && third <= Duration::from_millis(5_000));
        assert!(backoff.delay_for(30) <= Duration::from_secs(75));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&RetryPolicy::default(), &CancellationToken::new(), |_| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, PipelineError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&RetryPolicy::default(), &CancellationToken::new(), |_| {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(status_503())
                } else {
                    Ok::<u32, PipelineError>(1)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_are_fatal() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&RetryPolicy::bounded(2, fixed()), &CancellationToken::new(), |_| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, PipelineError>(status_503())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(
            matches!(
                result,
                Err(RetryError::Fatal(PipelineError::RetriesExhausted { attempts: 3, .. }))
            ),
            "got: {result:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_identity_rotation_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&RetryPolicy::default(), &CancellationToken::new(), |_| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, PipelineError>(
                    TransportError::IdentityRotation("refused".to_owned()).into(),
                )
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(RetryError::Fatal(ref e)) if e.is_identity_rotation()));
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_extraction_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&RetryPolicy::default(), &CancellationToken::new(), |_| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, PipelineError>(
                    ExtractionError::MissingCalendar {
                        url: "https://example.com".to_owned(),
                    }
                    .into(),
                )
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(RetryError::Fatal(PipelineError::Extraction(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let token = cancel.clone();
        let result = retry_with_backoff(&RetryPolicy::unbounded(fixed()), &cancel, |_| {
            let c = Arc::clone(&c);
            let token = token.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                token.cancel();
                Err::<u32, PipelineError>(status_503())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(RetryError::Interrupted(PipelineError::HttpStatus { status: 503, .. }))
        ));
    }

    #[test]
    fn classification() {
        assert!(status_503().is_retriable());
        assert!(PipelineError::from(TransportError::Timeout {
            url: "u".to_owned()
        })
        .is_retriable());
        assert!(!PipelineError::from(TransportError::IdentityRotation("x".to_owned())).is_retriable());
    }
}
