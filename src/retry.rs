//! Exponential backoff for calls to rate-limited services.
//!
//! [`RetryPolicy::run`] retries an async operation only while its error
//! classifies as rate-limited (see [`RetryClassify`]). Every other error is
//! handed back on the first attempt, untouched. Backoff is `base * 2^attempt`
//! with no jitter. A server `Retry-After` hint can lengthen a wait, up to the
//! policy's `max_delay`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Errors that can tell whether they came from a rate limiter.
///
/// Transports set this from the HTTP status they observed. Free-text sniffing
/// via [`looks_rate_limited`] belongs at the transport boundary only.
pub trait RetryClassify {
    fn is_rate_limited(&self) -> bool;

    /// Server-suggested wait before the next attempt, if one was sent.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl RetryClassify for anyhow::Error {
    fn is_rate_limited(&self) -> bool {
        looks_rate_limited(&format!("{self:#}"))
    }
}

/// Returns `true` if a failure description mentions a rate limit: HTTP 429,
/// "rate limit", or "too many requests" (case-insensitive).
pub fn looks_rate_limited(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests")
}

/// Failure returned by [`RetryPolicy::run`].
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every permitted retry hit the rate limiter.
    #[error("rate limit exceeded after {retries} retries: {last}")]
    RateLimitExhausted { retries: u32, last: String },

    /// A non-rate-limit failure, exactly as the operation returned it.
    #[error("{0}")]
    Failed(E),
}

/// Outcome of a single attempt, as recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Retryable,
    Fatal,
}

impl AttemptOutcome {
    pub fn of<T, E: RetryClassify>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) if e.is_rate_limited() => Self::Retryable,
            Err(_) => Self::Fatal,
        }
    }
}

/// One invocation attempt. Lives only for the duration of [`RetryPolicy::run`].
#[derive(Debug, Clone, Copy)]
pub struct RetryAttempt {
    pub index: u32,
    /// Wait before the next attempt; zero unless the outcome is retryable.
    pub wait: Duration,
    pub outcome: AttemptOutcome,
}

/// Default ceiling for server-suggested waits.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_retries: u32,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 3)
    }
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_retries,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Cap applied to `Retry-After` hints. The exponential schedule itself is
    /// never shortened.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Wait before retrying after the zero-based `attempt` failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(31))
    }

    /// Wait after `attempt` failed with an optional server hint. A hint can
    /// lengthen the backoff up to `max_delay`, never shorten it.
    pub fn wait_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let backoff = self.backoff(attempt);
        match hint {
            Some(hint) => backoff.max(hint.min(self.max_delay)),
            None => backoff,
        }
    }

    /// Run `op` until it succeeds, fails with a non-rate-limit error, or
    /// exhausts `max_retries`. At most `max_retries + 1` calls are made.
    ///
    /// `op` must be safe to repeat.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryClassify + Display,
    {
        let mut index = 0u32;
        loop {
            let result = op().await;
            let mut attempt = RetryAttempt {
                index,
                wait: Duration::ZERO,
                outcome: AttemptOutcome::of(&result),
            };

            let err = match (result, attempt.outcome) {
                (Ok(value), _) => {
                    if index > 0 {
                        tracing::info!(attempt = index + 1, "succeeded after rate-limit retries");
                    }
                    return Ok(value);
                }
                (Err(err), AttemptOutcome::Fatal) => {
                    tracing::debug!(attempt = index + 1, error = %err, "non-retryable failure");
                    return Err(RetryError::Failed(err));
                }
                (Err(err), _) => err,
            };

            if index >= self.max_retries {
                tracing::error!(
                    retries = self.max_retries,
                    error = %err,
                    "max retries reached for rate limit error"
                );
                return Err(RetryError::RateLimitExhausted {
                    retries: self.max_retries,
                    last: err.to_string(),
                });
            }

            attempt.wait = self.wait_for(index, err.retry_after());
            tracing::warn!(
                attempt = attempt.index + 1,
                max_retries = self.max_retries,
                wait_ms = attempt.wait.as_millis() as u64,
                error = %err,
                "rate limit hit, backing off"
            );
            tokio::time::sleep(attempt.wait).await;
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Limited,
        LimitedFor(Duration),
        Broken(&'static str),
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Limited | Self::LimitedFor(_) => f.write_str("HTTP 429 Too Many Requests"),
                Self::Broken(msg) => f.write_str(msg),
            }
        }
    }

    impl RetryClassify for TestError {
        fn is_rate_limited(&self) -> bool {
            matches!(self, Self::Limited | Self::LimitedFor(_))
        }

        fn retry_after(&self) -> Option<Duration> {
            match self {
                Self::LimitedFor(d) => Some(*d),
                _ => None,
            }
        }
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::new(Duration::from_millis(100), 5);
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn backoff_high_attempt_no_overflow() {
        let policy = RetryPolicy::new(Duration::from_secs(1), 100);
        assert!(policy.backoff(100) >= policy.backoff(30));
    }

    #[test]
    fn detects_rate_limit_text() {
        assert!(looks_rate_limited("HTTP status client error (429 Too Many Requests)"));
        assert!(looks_rate_limited("Rate Limit reached for model"));
        assert!(looks_rate_limited("TOO MANY REQUESTS"));
        assert!(!looks_rate_limited("connection refused"));
        assert!(!looks_rate_limited("500 internal server error"));
    }

    #[test]
    fn anyhow_errors_classify_by_message() {
        let limited = anyhow::anyhow!("upstream said: rate limit exceeded");
        let other = anyhow::anyhow!("disk full");
        assert!(limited.is_rate_limited());
        assert!(!other.is_rate_limited());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_n_plus_one_attempts() {
        for retries in 0..4u32 {
            let policy = RetryPolicy::new(Duration::from_millis(100), retries);
            let calls = Arc::new(AtomicU32::new(0));
            let start = tokio::time::Instant::now();

            let result: Result<(), _> = policy
                .run(|| {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(TestError::Limited)
                    }
                })
                .await;

            let expected_ms: u64 = (0..retries).map(|i| 100u64 << i).sum();
            assert_eq!(calls.load(Ordering::SeqCst), retries + 1);
            assert_eq!(start.elapsed(), Duration::from_millis(expected_ms));
            match result {
                Err(RetryError::RateLimitExhausted { retries: r, last }) => {
                    assert_eq!(r, retries);
                    assert!(last.contains("429"));
                }
                other => panic!("expected exhaustion, got {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_error_is_not_retried() {
        let policy = RetryPolicy::new(Duration::from_secs(1), 3);
        let calls = Arc::new(AtomicU32::new(0));
        let start = tokio::time::Instant::now();

        let result: Result<(), _> = policy
            .run(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Broken("bad request"))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        match result {
            Err(RetryError::Failed(err)) => assert_eq!(err, TestError::Broken("bad request")),
            other => panic!("expected original error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_rate_limit() {
        let policy = RetryPolicy::new(Duration::from_millis(50), 3);
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .run(|| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TestError::Limited)
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_hint_extends_wait() {
        let policy = RetryPolicy::new(Duration::from_millis(10), 1);
        let start = tokio::time::Instant::now();

        let _: Result<(), _> = policy
            .run(|| async { Err(TestError::LimitedFor(Duration::from_secs(2))) })
            .await;

        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_retry_after_is_capped() {
        let policy = RetryPolicy::new(Duration::from_millis(10), 1);
        let start = tokio::time::Instant::now();

        let result: Result<(), _> = policy
            .run(|| async { Err(TestError::LimitedFor(Duration::from_secs(86_400))) })
            .await;

        assert!(matches!(result, Err(RetryError::RateLimitExhausted { retries: 1, .. })));
        assert_eq!(start.elapsed(), DEFAULT_MAX_DELAY);
    }

    #[test]
    fn hint_never_shortens_backoff() {
        let policy = RetryPolicy::new(Duration::from_secs(4), 3).with_max_delay(Duration::from_secs(1));
        assert_eq!(policy.wait_for(0, Some(Duration::from_secs(60))), Duration::from_secs(4));
        assert_eq!(policy.wait_for(1, Some(Duration::from_millis(1))), Duration::from_secs(8));
        assert_eq!(policy.wait_for(2, None), Duration::from_secs(16));
    }

    #[test]
    fn attempt_outcome_classification() {
        let ok: Result<(), TestError> = Ok(());
        assert_eq!(AttemptOutcome::of(&ok), AttemptOutcome::Success);
        assert_eq!(
            AttemptOutcome::of::<(), _>(&Err(TestError::Limited)),
            AttemptOutcome::Retryable
        );
        assert_eq!(
            AttemptOutcome::of::<(), _>(&Err(TestError::Broken("nope"))),
            AttemptOutcome::Fatal
        );
    }
}
