// monitor/retry.rs
use rand::Rng;
use std::time::Duration;
use tracing::warn;

use crate::providers::ProviderError;

/// Retry policy for the scrape-backed status provider, applied uniformly
/// per address: a short in-place retry loop, then one batched second pass
/// after a long cooldown for everything that failed the first pass.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_delay: Duration,
    pub batch_cooldown: Duration,
    /// Upper bound on the random extra sleep added to each attempt delay.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            attempt_delay: Duration::from_secs(2),
            batch_cooldown: Duration::from_secs(60),
            jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Drive one address's attempts. Returns the last error once the
    /// attempt budget is spent.
    pub fn run<T, F>(&self, mut attempt: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Result<T, ProviderError>,
    {
        let mut last_err = None;

        for n in 1..=self.max_attempts.max(1) {
            match attempt() {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(attempt = n, error = %e, "provider attempt failed");
                    last_err = Some(e);
                    if n < self.max_attempts {
                        self.pause_between_attempts();
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ProviderError::Network("retry loop exhausted".into())))
    }

    pub fn pause_between_attempts(&self) {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        std::thread::sleep(self.attempt_delay + Duration::from_millis(extra));
    }

    /// The single long pause before the batched second pass.
    pub fn pause_before_second_pass(&self) {
        std::thread::sleep(self.batch_cooldown);
    }
}
