//! Per-source circuit breaker.
//!
//! Counts consecutive misses for one source. Any hit resets the count; once
//! the count reaches the threshold the source stays disabled for the rest of
//! the run.

/// Default number of consecutive misses before a source is disabled.
pub const DEFAULT_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreaker {
    threshold: u32,
    consecutive_failures: u32,
}

impl CircuitBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive_failures: 0,
        }
    }

    /// Whether calls to the source are still allowed.
    pub fn allows(&self) -> bool {
        !self.is_tripped()
    }

    pub fn is_tripped(&self) -> bool {
        self.consecutive_failures >= self.threshold
    }

    pub fn failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Count a miss. Returns `true` when this miss tripped the breaker.
    pub fn record_failure(&mut self) -> bool {
        let was_tripped = self.is_tripped();
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        !was_tripped && self.is_tripped()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
