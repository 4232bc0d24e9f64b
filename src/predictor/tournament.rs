//! A tournament predictor which chooses between a local and a global
//! predictor on a per-branch basis.

use crate::Outcome;
use crate::predictor::*;

/// A table of 2-bit counters which selects a component for each branch.
///
/// The most-significant bit of a counter selects the local component; all
/// counters start out "weakly" favoring the global component.
#[derive(Clone, Debug)]
pub struct Chooser {
    pht: PatternHistoryTable,
    codec: AddressCodec,
}
impl Chooser {
    /// Create a chooser with `size` counters. Branches are mapped onto the
    /// chooser using the same address index bits as the local BTB.
    pub fn new(size: usize, codec: AddressCodec) -> Self {
        Self {
            pht: PatternHistoryTable::new(size, SaturatingCounterConfig::TWO_BIT),
            codec,
        }
    }

    pub fn table(&self) -> &PatternHistoryTable { &self.pht }

    /// Returns 'true' if the local component should be used.
    pub fn use_local(&self, idx: usize) -> bool {
        self.pht.predict(idx).is_taken()
    }

    /// Move towards whichever component was correct when exactly one of
    /// them was.
    pub fn update(&mut self, idx: usize, local: Outcome, global: Outcome,
        outcome: Outcome)
    {
        let entry = self.pht.get_entry_mut(idx);
        match (local == outcome, global == outcome) {
            (true, false) => entry.increment(),
            (false, true) => entry.decrement(),
            _ => {},
        }
    }
}

impl PredictorTable for Chooser {
    type Input = u64;
    type Index = usize;
    type Entry = SaturatingCounter;

    fn size(&self) -> usize { self.pht.size() }

    fn get_index(&self, pc: u64) -> usize {
        (self.codec.index(pc) as usize) % self.size()
    }

    fn get_entry(&self, idx: usize) -> &SaturatingCounter {
        self.pht.get_entry(idx)
    }

    fn get_entry_mut(&mut self, idx: usize) -> &mut SaturatingCounter {
        self.pht.get_entry_mut(idx)
    }
}

/// Output from [`TournamentPredictor::predict`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TournamentPrediction {
    /// The final predicted direction
    pub outcome: Outcome,

    /// Prediction from the local component
    pub local: LocalPrediction,

    /// Prediction from the global component
    pub global: GlobalPrediction,

    /// Index of the chooser counter for this branch
    pub chooser_idx: usize,

    /// Whether the local component provided the final prediction
    pub used_local: bool,
}
impl Prediction for TournamentPrediction {
    fn outcome(&self) -> Outcome { self.outcome }
}

/// Combines a [LocalPrivatePredictor] and a [GlobalPredictor].
///
/// A branch which misses in the local component's BTB is predicted 'taken'
/// by the local component.
#[derive(Clone, Debug)]
pub struct TournamentPredictor {
    local: LocalPrivatePredictor,
    global: GlobalPredictor,
    chooser: Chooser,
}
impl TournamentPredictor {
    pub fn new(btb_entries: usize, bhr_bits: usize, ghr_bits: usize,
        chooser_entries: usize) -> Self
    {
        let local = LocalPrivatePredictor::new(
            btb_entries, bhr_bits, MissPolicy::PredictTaken
        );
        let codec = *local.btb().codec();
        Self {
            local,
            global: GlobalPredictor::new(ghr_bits),
            chooser: Chooser::new(chooser_entries, codec),
        }
    }

    pub fn local(&self) -> &LocalPrivatePredictor { &self.local }
    pub fn global(&self) -> &GlobalPredictor { &self.global }
    pub fn chooser(&self) -> &Chooser { &self.chooser }
}

impl BranchPredictor for TournamentPredictor {
    type Prediction = TournamentPrediction;

    fn name(&self) -> &'static str { "Tournament" }

    fn predict(&mut self, pc: u64) -> TournamentPrediction {
        let local = self.local.predict(pc);
        let global = self.global.predict_global();
        let chooser_idx = self.chooser.get_index(pc);
        let used_local = self.chooser.use_local(chooser_idx);
        TournamentPrediction {
            outcome: if used_local { local.outcome } else { global.outcome },
            local,
            global,
            chooser_idx,
            used_local,
        }
    }

    // Both components are always trained, regardless of which one was used.
    fn update(&mut self, pc: u64, prediction: TournamentPrediction,
        outcome: Outcome)
    {
        self.local.update(pc, prediction.local, outcome);
        self.global.update_global(prediction.global, outcome);
        self.chooser.update(prediction.chooser_idx,
            prediction.local.outcome, prediction.global.outcome, outcome
        );
    }
}
