//! Retry loop: run a closure until success or the policy says stop.

use super::policy::{RetryDecision, RetryPolicy, Sleeper};
use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

/// Every error seen while retrying, in attempt order.
#[derive(Debug)]
pub struct RetryError<E> {
    earlier: Vec<E>,
    last: E,
}

impl<E> RetryError<E> {
    /// Number of attempts made.
    pub fn attempts(&self) -> u32 {
        self.earlier.len() as u32 + 1
    }

    /// Error of the final attempt.
    pub fn last(&self) -> &E {
        &self.last
    }

    pub fn history(&self) -> impl Iterator<Item = &E> {
        self.earlier.iter().chain(std::iter::once(&self.last))
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {} attempt(s))", self.last, self.attempts())
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.last)
    }
}

/// Runs `op` until it succeeds or `policy` says to stop.
///
/// Only errors for which `is_retryable` holds are retried; the wait between
/// attempts goes through `sleeper`. Attempts run one after another on the
/// calling task.
pub async fn run_with_retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    is_retryable: P,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: fmt::Display,
{
    let mut earlier = Vec::new();
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) => match policy.decide(attempt, is_retryable(&err)) {
                RetryDecision::NoRetry => return Err(RetryError { earlier, last: err }),
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        ?delay,
                        error = %err,
                        "Attempt failed, retrying"
                    );
                    earlier.push(err);
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::test_helpers::RecordingSleeper;
    use crate::retry::{ErrorKind, classify_status};
    use std::cell::Cell;
    use std::future::ready;
    use std::time::Duration;

    const TEST_DELAY: Duration = Duration::from_secs(20);

    fn test_policy() -> RetryPolicy {
        RetryPolicy::new(TEST_DELAY, 5)
    }

    /// Replays `script` one entry per attempt, succeeding once it runs out.
    async fn run_script(
        script: Vec<ErrorKind>,
        sleeper: &RecordingSleeper,
    ) -> (Result<u32, RetryError<ErrorKind>>, u32) {
        let calls = Cell::new(0u32);
        let mut script = script.into_iter();
        let result = run_with_retry(&test_policy(), sleeper, ErrorKind::is_retryable, || {
            calls.set(calls.get() + 1);
            ready(match script.next() {
                Some(err) => Err(err),
                None => Ok(calls.get()),
            })
        })
        .await;
        (result, calls.get())
    }

    #[tokio::test]
    async fn test_succeeds_after_rate_limiting() {
        let sleeper = RecordingSleeper::default();
        let script = vec![classify_status(429, "slow down"); 2];

        let (result, calls) = run_script(script, &sleeper).await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
        assert_eq!(*sleeper.delays.lock().unwrap(), vec![TEST_DELAY; 2]);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let sleeper = RecordingSleeper::default();
        let script = vec![classify_status(404, "not found")];

        let (result, calls) = run_script(script, &sleeper).await;

        let err = result.unwrap_err();
        assert_eq!(calls, 1);
        assert_eq!(err.attempts(), 1);
        assert_eq!(err.last().status(), Some(404));
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_succeeds_on_last_allowed_attempt() {
        let sleeper = RecordingSleeper::default();
        let script = vec![classify_status(500, "backend error"); 4];

        let (result, calls) = run_script(script, &sleeper).await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls, 5);
        assert_eq!(sleeper.delays.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let script = vec![classify_status(503, "unavailable"); 6];

        let (result, calls) = run_script(script, &sleeper).await;

        let err = result.unwrap_err();
        assert_eq!(calls, 5);
        assert_eq!(err.attempts(), 5);
        assert_eq!(err.history().count(), 5);
        assert_eq!(sleeper.delays.lock().unwrap().len(), 4);
        assert!(err.to_string().contains("after 5 attempt(s)"));
    }

    #[tokio::test]
    async fn test_history_keeps_attempt_order() {
        let sleeper = RecordingSleeper::default();
        let script = vec![
            classify_status(500, "first"),
            classify_status(400, "A sheet with the name \"x\" already exists"),
        ];

        let (result, _) = run_script(script.clone(), &sleeper).await;

        let err = result.unwrap_err();
        let history: Vec<ErrorKind> = err.history().cloned().collect();
        assert_eq!(history, script);
        assert_eq!(sleeper.delays.lock().unwrap().len(), 1);
    }
}
