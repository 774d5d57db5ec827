//! Retransmission policy for one send/read attempt.

use crate::error::DhcpError;
use std::{future::Future, time::Duration};

/// Retries an attempt that timed out.
///
/// `retries` is the number of extra attempts after the first one; a negative
/// value retries forever. There is no backoff between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retries: i32,
    timeout: Duration,
}

impl RetryPolicy {
    pub fn new(retries: i32, timeout: Duration) -> Self {
        Self { retries, timeout }
    }

    pub fn retries(&self) -> i32 {
        self.retries
    }

    /// How long a single attempt may read for.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `attempt` until it succeeds, fails with anything other than
    /// [`DhcpError::DeadlineExceeded`], or the retries are used up.
    pub async fn run<F, Fut>(&self, mut attempt: F) -> Result<(), DhcpError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), DhcpError>>,
    {
        let mut remaining = self.retries;
        let mut tries = 0u64;
        loop {
            tries += 1;
            match attempt().await {
                Ok(()) => return Ok(()),
                Err(DhcpError::DeadlineExceeded) => {}
                Err(e) => return Err(e),
            }

            if remaining == 0 {
                tracing::debug!("No response after {} attempt(s), giving up", tries);
                return Err(DhcpError::DeadlineExceeded);
            }
            if remaining > 0 {
                remaining -= 1;
            }
            tracing::warn!(
                "No response within {:?} (attempt {}), retrying",
                self.timeout,
                tries
            );
        }
    }
}
