//! Attempt policy applied to every repository call.

use std::future::Future;
use std::num::NonZeroU32;

use crate::{Error, Result};

/// How many times a store call is attempted before its error is surfaced.
///
/// The default is a single attempt: a user action issues each network call
/// once and reports the outcome. Only store-kind errors are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    max_attempts: NonZeroU32,
}

impl CallPolicy {
    /// One attempt per call.
    pub const SINGLE_ATTEMPT: Self = Self {
        max_attempts: NonZeroU32::MIN,
    };

    pub fn new(max_attempts: u32) -> Result<Self> {
        NonZeroU32::new(max_attempts)
            .map(|max_attempts| Self { max_attempts })
            .ok_or_else(|| Error::validation("max attempts must be at least 1"))
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.get();
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts,
                        %error,
                        "Store call failed, trying again"
                    );
                    attempt += 1;
                }
                Err(error) => {
                    tracing::debug!(operation, attempt, %error, "Store call failed");
                    return Err(error);
                }
            }
        }
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::SINGLE_ATTEMPT
    }
}
