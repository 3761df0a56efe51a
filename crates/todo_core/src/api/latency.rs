//! Artificial latency policies for the simulated resource API.

use rand::Rng;
use std::time::Duration;

/// Produces the delay applied before each simulated call resolves.
pub trait LatencyPolicy: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Uniformly random delay within `[min_ms, max_ms]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLatency {
    min_ms: u64,
    max_ms: u64,
}

impl UniformLatency {
    /// Bounds given in the wrong order are swapped.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn bounds_ms(&self) -> (u64, u64) {
        (self.min_ms, self.max_ms)
    }
}

impl LatencyPolicy for UniformLatency {
    fn next_delay(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }
}

/// Zero delay, for deterministic tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoLatency;

impl LatencyPolicy for NoLatency {
    fn next_delay(&self) -> Duration {
        Duration::ZERO
    }
}
