//! A predictor indexed only by global branch history.

use crate::Outcome;
use crate::history::*;
use crate::predictor::*;

/// Output from [`GlobalPredictor::predict`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalPrediction {
    /// The predicted direction
    pub outcome: Outcome,
    /// The value of global history used to select a counter
    pub idx: usize,
}
impl Prediction for GlobalPrediction {
    fn outcome(&self) -> Outcome { self.outcome }
}

/// A single global history register selecting one counter from a table
/// with an entry for every possible history value.
///
/// The branch address is not used at all.
#[derive(Clone, Debug)]
pub struct GlobalPredictor {
    ghr: HistoryRegister,
    pht: PatternHistoryTable,
}
impl GlobalPredictor {
    pub fn new(ghr_bits: usize) -> Self {
        Self {
            ghr: HistoryRegister::new(ghr_bits),
            pht: PatternHistoryTable::for_history_bits(ghr_bits),
        }
    }

    pub fn history(&self) -> &HistoryRegister { &self.ghr }
    pub fn table(&self) -> &PatternHistoryTable { &self.pht }

    /// Predict using the current state of global history.
    pub fn predict_global(&self) -> GlobalPrediction {
        let idx = self.ghr.as_index();
        GlobalPrediction { outcome: self.pht.predict(idx), idx }
    }

    /// Train the counter that made `prediction`, then shift the outcome into
    /// global history.
    pub fn update_global(&mut self, prediction: GlobalPrediction,
        outcome: Outcome)
    {
        self.pht.update(prediction.idx, outcome);
        self.ghr.update(outcome);
    }
}

impl BranchPredictor for GlobalPredictor {
    type Prediction = GlobalPrediction;

    fn name(&self) -> &'static str { "Global" }

    fn predict(&mut self, _pc: u64) -> GlobalPrediction {
        self.predict_global()
    }

    fn update(&mut self, _pc: u64, prediction: GlobalPrediction,
        outcome: Outcome)
    {
        self.update_global(prediction, outcome);
    }
}
