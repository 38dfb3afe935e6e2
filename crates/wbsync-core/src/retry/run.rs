//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::policy::{ErrorKind, RetryDecision, RetryPolicy};
use crate::archive::ArchiveError;

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
///
/// The closure receives the 1-based attempt number. A retryable error that
/// hits the attempt ceiling is returned as [`ArchiveError::RetriesExhausted`];
/// non-retryable errors are returned as-is. Blocks the calling thread while
/// backing off; async callers run this under `spawn_blocking`.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, ArchiveError>
where
    F: FnMut(u32) -> Result<T, ArchiveError>,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry if kind == ErrorKind::Other => return Err(e),
                    RetryDecision::NoRetry => {
                        return Err(ArchiveError::RetriesExhausted {
                            attempts: attempt,
                            source: Box::new(e),
                        })
                    }
                    RetryDecision::RetryAfter(d) => {
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
