//! Setpoint value sources

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Produces the value of each periodic setpoint command
pub trait SetpointSource: Send {
    fn next_value(&mut self) -> i16;
}

impl<F> SetpointSource for F
where
    F: FnMut() -> i16 + Send,
{
    fn next_value(&mut self) -> i16 {
        self()
    }
}

/// Uniformly distributed values from a half-open range
#[derive(Debug, Clone)]
pub struct RandomSetpoint {
    range: Range<i16>,
    rng: StdRng,
}

impl RandomSetpoint {
    /// Default power limitation range
    pub const DEFAULT_RANGE: Range<i16> = 20000..25000;

    /// Values from `range`; an empty range always yields its start
    pub fn new(range: Range<i16>) -> Self {
        Self {
            range,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence for a given seed
    pub fn with_seed(range: Range<i16>, seed: u64) -> Self {
        Self {
            range,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSetpoint {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RANGE)
    }
}

impl SetpointSource for RandomSetpoint {
    fn next_value(&mut self) -> i16 {
        if self.range.is_empty() {
            return self.range.start;
        }
        self.rng.gen_range(self.range.clone())
    }
}
