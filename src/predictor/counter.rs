//! Implementation of a saturating counter.

use crate::Outcome;
use crate::predictor::StatefulPredictor;

/// Configuration for building a [`SaturatingCounter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaturatingCounterConfig {
    /// The largest value the counter can hold ("strongly taken").
    pub max_state: u8,
    /// The value of a freshly-built or reset counter.
    pub init_state: u8,
}
impl SaturatingCounterConfig {
    /// A 2-bit counter which starts out "weakly not-taken" (01).
    pub const TWO_BIT: Self = Self { max_state: 3, init_state: 1 };

    pub fn build(self) -> SaturatingCounter {
        assert!(self.max_state > 0 && self.init_state <= self.max_state);
        SaturatingCounter {
            cfg: self,
            ctr: self.init_state,
        }
    }
}
impl Default for SaturatingCounterConfig {
    fn default() -> Self { Self::TWO_BIT }
}

/// An N-bit saturating counter used to follow the behavior of a branch.
///
/// The most-significant bit of the counter is the predicted direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaturatingCounter {
    cfg: SaturatingCounterConfig,
    ctr: u8,
}
impl SaturatingCounter {
    /// Move towards "taken", saturating at the maximum value.
    pub fn increment(&mut self) {
        self.ctr = self.ctr.saturating_add(1).min(self.cfg.max_state);
    }

    /// Move towards "not-taken", saturating at zero.
    pub fn decrement(&mut self) {
        self.ctr = self.ctr.saturating_sub(1);
    }

    /// Return the raw counter value.
    pub fn value(&self) -> u8 { self.ctr }

    /// Threshold at which the most-significant bit becomes set.
    fn msb(&self) -> u8 {
        1 << self.cfg.max_state.ilog2()
    }
}

impl StatefulPredictor for SaturatingCounter {
    fn name(&self) -> &'static str { "SaturatingCounter" }
    fn predict(&self) -> Outcome {
        Outcome::from_bool(self.ctr & self.msb() != 0)
    }
    fn reset(&mut self) {
        self.ctr = self.cfg.init_state;
    }
    fn update(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::T => self.increment(),
            Outcome::N => self.decrement(),
        }
    }
}

impl Default for SaturatingCounter {
    fn default() -> Self { SaturatingCounterConfig::TWO_BIT.build() }
}
