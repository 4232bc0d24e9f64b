//! Implementations of a pattern history table (PHT).

use crate::Outcome;
use crate::predictor::*;
use crate::predictor::counter::*;

/// A direct-mapped table of [SaturatingCounter].
///
/// The table has a power-of-two number of entries. Indexes are masked to
/// the table size, so any index handed to the table is in bounds.
#[derive(Clone, Debug)]
pub struct PatternHistoryTable {
    /// Table of counters
    data: Vec<SaturatingCounter>,

    /// Number of entries
    size: usize,
}
impl PatternHistoryTable {
    pub fn new(size: usize, cfg: SaturatingCounterConfig) -> Self {
        assert!(size.is_power_of_two());
        Self {
            data: vec![cfg.build(); size],
            size,
        }
    }

    /// Create a table with one counter for every value of an 'n'-bit
    /// history register.
    pub fn for_history_bits(bits: usize) -> Self {
        Self::new(1 << bits, SaturatingCounterConfig::TWO_BIT)
    }

    /// Predict using the counter at some index.
    pub fn predict(&self, idx: usize) -> Outcome {
        self.get_entry(idx).predict()
    }

    /// Train the counter at some index with the resolved outcome.
    pub fn update(&mut self, idx: usize, outcome: Outcome) {
        self.get_entry_mut(idx).update(outcome);
    }

    /// Reset all counters to their initial state.
    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|c| c.reset());
    }

    pub fn counters(&self) -> &[SaturatingCounter] { &self.data }
}

impl PredictorTable for PatternHistoryTable {
    type Input = u64;
    type Index = usize;
    type Entry = SaturatingCounter;

    fn size(&self) -> usize { self.size }

    // Directly indexed with low bits from the input
    fn get_index(&self, input: u64) -> usize {
        (input as usize) & self.index_mask()
    }

    fn get_entry(&self, idx: usize) -> &SaturatingCounter {
        let index = idx & self.index_mask();
        &self.data[index]
    }

    fn get_entry_mut(&mut self, idx: usize) -> &mut SaturatingCounter {
        let index = idx & self.index_mask();
        &mut self.data[index]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counters_start_weakly_not_taken() {
        let pht = PatternHistoryTable::for_history_bits(3);
        assert_eq!(pht.size(), 8);
        assert!(pht.counters().iter().all(|c| c.value() == 1));
    }

    #[test]
    fn index_wraps_to_size() {
        let mut pht = PatternHistoryTable::for_history_bits(2);
        pht.update(5, Outcome::T);
        assert_eq!(pht.get_entry(1).value(), 2);
        assert_eq!(pht.get_index(0x1007), 3);
        pht.reset();
        assert_eq!(pht.get_entry(1).value(), 1);
    }
}
