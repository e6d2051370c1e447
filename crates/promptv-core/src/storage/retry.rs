//! Bounded retry for transient backend failures.

use std::thread;
use std::time::Duration;

use crate::error::Result;

/// How often a transient backend failure is retried before it surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(10),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Run `op`, retrying while it fails with a transient error.
    ///
    /// Backoff grows linearly with the attempt number. Non-transient errors
    /// and the last transient error are returned unchanged.
    pub fn run<T>(&self, what: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            match op() {
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(operation = what, attempt, error = %err, "retrying transient storage failure");
                    thread::sleep(self.backoff * attempt);
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PromptvError};
    use std::io;

    fn transient() -> PromptvError {
        io::Error::new(io::ErrorKind::Interrupted, "interrupted").into()
    }

    #[test]
    fn test_retries_transient_until_success() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff: Duration::ZERO,
        };
        let mut calls = 0;
        let value = policy
            .run("read", || {
                calls += 1;
                if calls < 3 {
                    Err(transient())
                } else {
                    Ok(calls)
                }
            })
            .unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let policy = RetryPolicy {
            max_retries: 2,
            backoff: Duration::ZERO,
        };
        let mut calls = 0;
        let err = policy
            .run("write", || -> Result<()> {
                calls += 1;
                Err(transient())
            })
            .unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
    }

    #[test]
    fn test_does_not_retry_persistent_errors() {
        let mut calls = 0;
        let err = RetryPolicy::default()
            .run("write", || -> Result<()> {
                calls += 1;
                Err(PromptvError::storage("disk full"))
            })
            .unwrap_err();
        assert_eq!(calls, 1);
        assert!(!err.is_transient());
    }
}
