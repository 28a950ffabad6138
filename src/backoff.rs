//! Exponential backoff state shared by page fetches and image uploads.
use std::time::Duration;

/// Retry behavior for one kind of operation.
///
/// Page fetches and image uploads share the delay curve but differ in what
/// happens once the delay stops growing: uploads give up after
/// `max_attempts_at_cap` failures at the ceiling, page fetches
/// (`max_attempts_at_cap: None`) retry forever.
#[derive(Debug, Copy, Clone)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts_at_cap: Option<u32>,
}

impl RetryPolicy {
    /// Fresh backoff state for one logical operation (one page fetch or one
    /// image's upload attempts). Discarded on success or exhaustion.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            current_delay: self.initial_delay,
            attempts_at_cap: 0,
            policy: *self,
        }
    }
}

#[derive(Debug)]
pub struct Backoff {
    current_delay: Duration,
    attempts_at_cap: u32,
    policy: RetryPolicy,
}

impl Backoff {
    /// Registers a failed attempt and returns how long to wait before the
    /// next one. The delay doubles on every failure until it reaches the
    /// policy maximum; failures at the ceiling keep the delay and count
    /// toward exhaustion instead.
    pub fn on_failure(&mut self) -> Duration {
        let delay = self.current_delay;

        if self.current_delay < self.policy.max_delay {
            self.current_delay = (self.current_delay * 2).min(self.policy.max_delay);
        } else {
            self.attempts_at_cap += 1;
        }

        delay
    }

    /// True once the failure budget at the ceiling delay is spent.
    pub fn is_exhausted(&self) -> bool {
        self.policy
            .max_attempts_at_cap
            .map_or(false, |max| self.attempts_at_cap >= max)
    }
}
