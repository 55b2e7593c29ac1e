//! Polite pacing and bounded waits
//!
//! Bursts of back-to-back requests are what trips most anti-bot defenses, so
//! every strategy calls `Pacer::pace` between outbound actions. Every network
//! wait is wrapped in `with_timeout` so no operation blocks indefinitely.

use crate::config::PacingConfig;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// An operation did not complete within its allotted time
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} timed out after {after:?}")]
pub struct TimeoutError {
    pub operation: String,
    pub after: Duration,
}

/// Inserts a random delay drawn uniformly from `[min_delay, max_delay]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    min_delay: Duration,
    max_delay: Duration,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(Duration::ZERO, Duration::from_millis(200))
    }
}

impl Pacer {
    /// Creates a pacer; the bounds are swapped if given in the wrong order
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        if min_delay <= max_delay {
            Self {
                min_delay,
                max_delay,
            }
        } else {
            Self {
                min_delay: max_delay,
                max_delay: min_delay,
            }
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// A pacer that never waits
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Draws the next delay
    pub fn next_delay(&self) -> Duration {
        if self.min_delay == self.max_delay {
            return self.min_delay;
        }
        let millis = rand::thread_rng()
            .gen_range(self.min_delay.as_millis() as u64..=self.max_delay.as_millis() as u64);
        Duration::from_millis(millis)
    }

    /// Sleeps for a freshly drawn delay
    pub async fn pace(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        tracing::debug!("Pacing for {:.2}s", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }
}

/// Runs `future`, failing with `TimeoutError` if it takes longer than `duration`
pub async fn with_timeout<F, T>(
    operation: &str,
    duration: Duration,
    future: F,
) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError {
            operation: operation.to_string(),
            after: duration,
        })
}
