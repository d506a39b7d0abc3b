use rand::Rng;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryStrategy {
    Fixed,
    Exponential,
}

/// Backoff applied by a replication host when an append RPC fails at the transport level.
///
/// `max_attempts == None` retries until the host is paused, stopped, or the partition's term
/// moves on.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    strategy: RetryStrategy,
    max_attempts: Option<usize>,
    base_delay: Duration,
    max_delay: Duration,
    jitter_fraction: f64,
}

impl RetryPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self::new(RetryStrategy::Fixed, interval)
    }

    pub fn exponential(base_delay: Duration, max_delay: Duration) -> Self {
        Self::new(RetryStrategy::Exponential, base_delay).with_max_delay(max_delay)
    }

    fn new(strategy: RetryStrategy, base_delay: Duration) -> Self {
        RetryPolicy {
            strategy,
            max_attempts: None,
            base_delay,
            max_delay: base_delay,
            jitter_fraction: 0.0,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay.max(self.base_delay);
        self
    }

    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.max(0.0).min(1.0);
        self
    }

    pub fn strategy(&self) -> RetryStrategy {
        self.strategy
    }

    pub fn handle(&self) -> RetryHandle {
        RetryHandle {
            policy: self.clone(),
            attempts: 0,
        }
    }

    /// Delay before retry number `attempt` (1-based), before jitter.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let raw = match self.strategy {
            RetryStrategy::Fixed => self.base_delay,
            RetryStrategy::Exponential => {
                let shift = attempt.saturating_sub(1).min(31) as u32;
                self.base_delay
                    .checked_mul(1u32 << shift)
                    .unwrap_or(self.max_delay)
            }
        };
        raw.min(self.max_delay)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter_fraction <= 0.0 || delay == Duration::from_millis(0) {
            return delay;
        }
        let factor = rand::thread_rng().gen_range((1.0 - self.jitter_fraction)..=(1.0 + self.jitter_fraction));
        Duration::from_secs_f64(delay.as_secs_f64() * factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::exponential(Duration::from_millis(50), Duration::from_secs(2)).with_jitter(0.2)
    }
}

/// Tracks the attempts of one request.
pub struct RetryHandle {
    policy: RetryPolicy,
    attempts: usize,
}

impl RetryHandle {
    /// Delay to wait before the next attempt, or `None` once attempts are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(max_attempts) = self.policy.max_attempts {
            if self.attempts + 1 >= max_attempts {
                return None;
            }
        }
        self.attempts += 1;
        Some(self.policy.jittered(self.policy.delay_for(self.attempts)))
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }
}
