//! Bounded retry with backoff.
//!
//! The delay before attempt `n + 1` is `base * factor^(n - 1)` plus a random
//! jitter in `[0, jitter)`. An `Err` from the operation counts as a failed
//! attempt; the helper never retries more than `attempts` times in total.

use rand::Rng;
use std::time::Duration;

use crate::config::section::RetryConfig;
use crate::core::Sleeper;
use crate::event;
use crate::logger::EventSink;

/// Retry schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    /// Total attempts, including the first. At least one always runs.
    pub attempts: u32,
    pub base: Duration,
    pub factor: f64,
    /// Upper bound of the random extra delay.
    pub jitter: Duration,
}

impl Backoff {
    pub const DEFAULT_JITTER: Duration = Duration::from_millis(1500);
    /// Longest deterministic delay between two attempts.
    pub const MAX_DELAY: Duration = Duration::from_secs(3600);
    /// Most attempts a configured schedule may ask for.
    pub const MAX_ATTEMPTS: u32 = 20;

    /// Doubling delays with up to 1.5s of jitter.
    pub fn exponential(attempts: u32, base: Duration) -> Self {
        Self {
            attempts,
            base,
            factor: 2.0,
            jitter: Self::DEFAULT_JITTER,
        }
    }

    /// Constant delay, no jitter.
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            base: delay,
            factor: 1.0,
            jitter: Duration::ZERO,
        }
    }

    pub fn from_config(retry: &RetryConfig) -> Self {
        Self::exponential(retry.attempts.min(Self::MAX_ATTEMPTS), retry.base_delay())
    }

    /// Deterministic part of the delay after `failed` failed attempts,
    /// capped at [`Self::MAX_DELAY`].
    pub fn delay_before(&self, failed: u32) -> Duration {
        let exp = failed.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base.as_secs_f64() * self.factor.powi(exp);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(Self::MAX_DELAY)
            .min(Self::MAX_DELAY)
    }

    /// Deterministic delays between attempts, one fewer than `attempts`.
    pub fn delays(&self) -> Vec<Duration> {
        (1..self.attempts.max(1)).map(|n| self.delay_before(n)).collect()
    }

    fn jitter(&self) -> Duration {
        if self.jitter.is_zero() {
            return Duration::ZERO;
        }
        let secs = rand::thread_rng().gen_range(0.0..self.jitter.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Run `op` until it returns `Ok(true)` or attempts run out.
///
/// `op` receives the 1-based attempt number.
pub fn retry<F>(
    label: &str,
    backoff: &Backoff,
    sleeper: &dyn Sleeper,
    sink: &dyn EventSink,
    mut op: F,
) -> bool
where
    F: FnMut(u32) -> anyhow::Result<bool>,
{
    let attempts = backoff.attempts.max(1);

    for attempt in 1..=attempts {
        match op(attempt) {
            Ok(true) => {
                if attempt > 1 {
                    event!(sink, "retry"; "{label} succeeded on attempt {attempt}/{attempts}");
                }
                return true;
            }
            Ok(false) => event!(sink, "retry"; "{label} attempt {attempt}/{attempts} failed"),
            Err(e) => event!(sink, "retry"; "{label} attempt {attempt}/{attempts} failed: {e:#}"),
        }

        if attempt < attempts {
            let delay = backoff.delay_before(attempt) + backoff.jitter();
            event!(sink, "retry"; "retrying {label} in {:.2}s", delay.as_secs_f64());
            sleeper.sleep(delay);
        }
    }

    event!(sink, "retry"; "{label} gave up after {attempts} attempts");
    false
}
