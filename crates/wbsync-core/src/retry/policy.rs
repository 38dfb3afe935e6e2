use std::time::Duration;

use crate::config::RetryConfig;

/// Why an archive or live call failed, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or transfer deadline hit.
    Timeout,
    /// The archive is rate limiting us (429, 503).
    Throttled,
    /// Reset, refused, DNS failure, truncated body.
    Connection,
    /// Any other server-side 5xx.
    Http5xx(u16),
    /// Not worth retrying (404, malformed response, cancellation).
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Bounded exponential backoff for archive calls.
///
/// Attempt `n` (1-based) that fails retryably waits `base_delay * 2^(n-1)`,
/// capped at `max_delay`. Throttling waits twice as long, since the public
/// archive answers bursts with 429 until the client backs off.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Hard ceiling on attempts per call, the first included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(cfg.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// What to do after `attempt` failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        let factor = match kind {
            ErrorKind::Other => return RetryDecision::NoRetry,
            ErrorKind::Throttled => 2,
            ErrorKind::Timeout | ErrorKind::Connection | ErrorKind::Http5xx(_) => 1,
        };
        let doublings = attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .saturating_mul(factor << doublings)
            .min(self.max_delay);
        RetryDecision::RetryAfter(delay)
    }
}
