//! Jittered single-retry for transient extraction failures

use std::time::Duration;

use rand::Rng;

/// Upper bound for the random pre-attempt delay
pub const MAX_JITTER: Duration = Duration::from_millis(50);

/// Sleep a uniform random delay in `[0, max)`.
fn jitter_sleep(max: Duration) {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return;
    }
    let delay = rand::rng().random_range(0..max_ms);
    std::thread::sleep(Duration::from_millis(delay));
}

/// Run `attempt`, retrying exactly once more on failure.
///
/// A short randomized delay precedes every attempt so concurrent workers
/// do not hit a struggling upstream in lockstep; the bounded single retry
/// absorbs transient failures without amplifying load into a retry storm.
/// The second failure is returned to the caller.
pub fn with_jitter_retry<T, E: std::fmt::Display>(
    label: &str,
    mut attempt: impl FnMut() -> Result<T, E>,
) -> Result<T, E> {
    jitter_sleep(MAX_JITTER);
    match attempt() {
        Ok(v) => Ok(v),
        Err(e) => {
            log::warn!("{label}: attempt failed ({e}), retrying once");
            jitter_sleep(MAX_JITTER);
            attempt()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn first_success_skips_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_jitter_retry("unit", || {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok(42)
        });
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn transient_failure_recovered_by_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_jitter_retry("unit", || {
            if calls.fetch_add(1, Ordering::Relaxed) == 0 {
                Err("transient")
            } else {
                Ok(7)
            }
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn second_failure_is_terminal() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_jitter_retry("unit", || {
            calls.fetch_add(1, Ordering::Relaxed);
            Err("still down")
        });
        assert_eq!(result, Err("still down"));
        // Exactly one retry, never more
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }
}
