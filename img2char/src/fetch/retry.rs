//! Retry policies for transient failures.
//!
//! A [`RetryPolicy`] describes how often and with what backoff a transient
//! failure is retried; [`retry_with`] applies one to any fallible
//! operation together with a retryable-error predicate. The fetcher uses
//! an unbounded fixed policy by default so an interrupted download keeps
//! trying until the server has nothing more to give.

use std::thread;
use std::time::Duration;

/// Default initial delay for exponential backoff (100ms).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 100;

/// Default maximum delay for exponential backoff (30 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;

/// Default multiplier for exponential backoff.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// How an operation handles transient failures.
#[derive(Clone, Debug, PartialEq)]
pub enum RetryPolicy {
    /// No retries, fail immediately on error.
    None,

    /// Constant delay between attempts. `max_attempts` counts the initial
    /// attempt; `None` retries forever.
    Fixed {
        max_attempts: Option<u32>,
        delay: Duration,
    },

    /// Exponential backoff: the delay is multiplied after each failed
    /// attempt, capped at `max_delay`.
    ExponentialBackoff {
        max_attempts: Option<u32>,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::None
    }
}

impl RetryPolicy {
    /// Fixed delay with a bounded attempt count.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::Fixed {
            max_attempts: Some(max_attempts),
            delay,
        }
    }

    /// Fixed delay, retrying forever.
    pub fn unbounded(delay: Duration) -> Self {
        Self::Fixed {
            max_attempts: None,
            delay,
        }
    }

    /// Exponential backoff with sensible defaults.
    pub fn exponential(max_attempts: u32) -> Self {
        Self::ExponentialBackoff {
            max_attempts: Some(max_attempts),
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Delay before retry number `attempt` (1-based), or `None` when no
    /// more retries are allowed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed {
                max_attempts,
                delay,
            } => {
                if max_attempts.map_or(true, |max| attempt < max) {
                    Some(*delay)
                } else {
                    None
                }
            }
            Self::ExponentialBackoff {
                max_attempts,
                initial_delay,
                max_delay,
                multiplier,
            } => {
                if max_attempts.map_or(true, |max| attempt < max) {
                    let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
                    let delay_ms = initial_delay.as_millis() as f64 * factor;
                    let capped = delay_ms.min(max_delay.as_millis() as f64);
                    Some(Duration::from_millis(capped as u64))
                } else {
                    None
                }
            }
        }
    }
}

/// Run `op`, retrying per `policy` while `is_transient` holds.
///
/// The operation is responsible for making each attempt safe to repeat
/// (the fetcher, for example, recomputes its resume offset from disk on
/// every attempt). Returns the last error once the policy is exhausted or
/// a non-transient error occurs.
pub fn retry_with<T, E>(
    policy: &RetryPolicy,
    is_transient: impl Fn(&E) -> bool,
    mut op: impl FnMut() -> Result<T, E>,
) -> Result<T, E> {
    let mut attempt: u32 = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) => {
                attempt += 1;
                match policy.delay_for_attempt(attempt) {
                    Some(delay) => thread::sleep(delay),
                    None => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_none_never_retries() {
        assert_eq!(RetryPolicy::None.delay_for_attempt(1), None);
    }

    #[test]
    fn test_fixed_bounded() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_secs(5)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_secs(5)));
        assert_eq!(policy.delay_for_attempt(3), None);
    }

    #[test]
    fn test_fixed_unbounded() {
        let policy = RetryPolicy::unbounded(Duration::from_secs(5));
        assert_eq!(
            policy.delay_for_attempt(10_000),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_exponential_growth_and_cap() {
        let policy = RetryPolicy::ExponentialBackoff {
            max_attempts: Some(10),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(400),
            multiplier: 2.0,
        };
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_millis(400)));
        // Capped from here on
        assert_eq!(policy.delay_for_attempt(4), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_for_attempt(10), None);
    }

    #[test]
    fn test_retry_with_eventual_success() {
        let calls = Cell::new(0);
        let result: Result<u32, &str> = retry_with(
            &RetryPolicy::fixed(5, Duration::from_millis(1)),
            |_| true,
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err("transient")
                } else {
                    Ok(42)
                }
            },
        );
        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_with_exhaustion() {
        let calls = Cell::new(0);
        let result: Result<(), &str> = retry_with(
            &RetryPolicy::fixed(3, Duration::from_millis(1)),
            |_| true,
            || {
                calls.set(calls.get() + 1);
                Err("still broken")
            },
        );
        assert_eq!(result, Err("still broken"));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_with_non_transient_fails_fast() {
        let calls = Cell::new(0);
        let result: Result<(), &str> = retry_with(
            &RetryPolicy::fixed(5, Duration::from_millis(1)),
            |e| *e != "fatal",
            || {
                calls.set(calls.get() + 1);
                Err("fatal")
            },
        );
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls.get(), 1);
    }
}
