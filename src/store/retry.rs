//! Retry policy for conflicting metadata writes
//!
//! Exponential back-off without jitter: 50 ms, doubling each round, capped at
//! 2 s. Many writers colliding at the same instant back off in lockstep and may
//! collide again; the retry budget bounds how long that can go on.

use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(50);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(2);
pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;

/// How many times a conflicting save is reloaded, merged and retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero means a single attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule::new(self.initial_backoff, self.max_backoff, self.multiplier)
    }
}

/// Successive back-off waits for one retry loop.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    current: Duration,
    max: Duration,
    multiplier: u32,
}

impl BackoffSchedule {
    pub fn new(initial: Duration, max: Duration, multiplier: u32) -> Self {
        Self {
            current: initial.min(max),
            max,
            multiplier,
        }
    }

    /// Return the wait for this round and advance to the next one.
    pub fn next_wait(&mut self) -> Duration {
        let wait = self.current;
        self.current = self
            .current
            .checked_mul(self.multiplier)
            .unwrap_or(self.max)
            .min(self.max);
        wait
    }
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_wait())
    }
}
