//! Predictors indexed by per-branch (local) history.
//!
//! Both predictors here keep a history register for each branch in a
//! [BranchTargetBuffer]. They differ in where the counters live:
//!
//! - [LocalSharedPredictor] uses one table of counters shared by every
//!   branch, indexed by the branch's local history.
//! - [LocalPrivatePredictor] gives every BTB entry its own table.

use crate::Outcome;
use crate::history::*;
use crate::predictor::*;

/// What a local predictor does for a branch that is not resident in its BTB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissPolicy {
    /// Allocate an entry right away and treat the branch exactly like a hit:
    /// predict from the freshly reset entry and train it.
    Allocate,

    /// Predict 'taken' without consulting any counters. The entry is only
    /// allocated when the branch is resolved, and nothing is trained.
    PredictTaken,
}

/// Output from a local predictor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalPrediction {
    /// The predicted direction
    pub outcome: Outcome,

    /// The entry used to make this prediction (if any)
    pub entry: Option<BTBHandle>,

    /// Whether the branch was already resident in the BTB
    pub hit: bool,
}
impl Prediction for LocalPrediction {
    fn outcome(&self) -> Outcome { self.outcome }
}

/// Per-branch state for a [LocalPrivatePredictor]: a local history register
/// and a private table of counters indexed by it.
///
/// The counter table is allocated once when the BTB is built and is reset
/// in place when the entry is reallocated.
#[derive(Clone, Debug)]
pub struct PrivateHistory {
    pub history: HistoryRegister,
    pub pht: PatternHistoryTable,
}
impl PrivateHistory {
    pub fn new(bhr_bits: usize) -> Self {
        Self {
            history: HistoryRegister::new(bhr_bits),
            pht: PatternHistoryTable::for_history_bits(bhr_bits),
        }
    }

    fn predict(&self) -> Outcome {
        self.pht.predict(self.history.as_index())
    }

    fn update(&mut self, outcome: Outcome) {
        self.pht.update(self.history.as_index(), outcome);
        self.history.update(outcome);
    }
}
impl EntryState for PrivateHistory {
    fn reset(&mut self) {
        self.history.reset();
        self.pht.reset();
    }
}

/// Local history per branch, with a single table of counters shared by all
/// branches.
#[derive(Clone, Debug)]
pub struct LocalSharedPredictor {
    btb: BranchTargetBuffer<HistoryRegister>,
    pht: PatternHistoryTable,
}
impl LocalSharedPredictor {
    pub fn new(btb_entries: usize, bhr_bits: usize) -> Self {
        Self {
            btb: BranchTargetBuffer::new(btb_entries,
                HistoryRegister::new(bhr_bits)),
            pht: PatternHistoryTable::for_history_bits(bhr_bits),
        }
    }

    pub fn btb(&self) -> &BranchTargetBuffer<HistoryRegister> { &self.btb }
    pub fn table(&self) -> &PatternHistoryTable { &self.pht }
}

impl BranchPredictor for LocalSharedPredictor {
    type Prediction = LocalPrediction;

    fn name(&self) -> &'static str { "LocalShared" }

    // A miss allocates a new entry (with empty history) and then goes through
    // the same path as a hit.
    fn predict(&mut self, pc: u64) -> LocalPrediction {
        let access = self.btb.lookup_or_insert(pc);
        let entry = self.btb.entry(access.handle());
        LocalPrediction {
            outcome: self.pht.predict(entry.state.as_index()),
            entry: Some(access.handle()),
            hit: access.is_hit(),
        }
    }

    fn update(&mut self, pc: u64, prediction: LocalPrediction,
        outcome: Outcome)
    {
        let handle = match prediction.entry {
            Some(handle) => handle,
            None => self.btb.insert_or_evict(pc),
        };
        let entry = self.btb.entry_mut(handle);
        self.pht.update(entry.state.as_index(), outcome);
        entry.state.update(outcome);
        self.btb.touch(handle);
    }
}

/// Local history per branch, with a private table of counters per branch.
#[derive(Clone, Debug)]
pub struct LocalPrivatePredictor {
    btb: BranchTargetBuffer<PrivateHistory>,
    miss_policy: MissPolicy,
}
impl LocalPrivatePredictor {
    pub fn new(btb_entries: usize, bhr_bits: usize, miss_policy: MissPolicy)
        -> Self
    {
        Self {
            btb: BranchTargetBuffer::new(btb_entries,
                PrivateHistory::new(bhr_bits)),
            miss_policy,
        }
    }

    pub fn btb(&self) -> &BranchTargetBuffer<PrivateHistory> { &self.btb }
}

impl BranchPredictor for LocalPrivatePredictor {
    type Prediction = LocalPrediction;

    fn name(&self) -> &'static str { "LocalPrivate" }

    fn predict(&mut self, pc: u64) -> LocalPrediction {
        if let Some(handle) = self.btb.lookup(pc) {
            return LocalPrediction {
                outcome: self.btb.entry(handle).state.predict(),
                entry: Some(handle),
                hit: true,
            };
        }

        match self.miss_policy {
            MissPolicy::Allocate => {
                let handle = self.btb.insert_or_evict(pc);
                LocalPrediction {
                    outcome: self.btb.entry(handle).state.predict(),
                    entry: Some(handle),
                    hit: false,
                }
            },
            MissPolicy::PredictTaken => LocalPrediction {
                outcome: Outcome::T,
                entry: None,
                hit: false,
            },
        }
    }

    fn update(&mut self, pc: u64, prediction: LocalPrediction,
        outcome: Outcome)
    {
        match prediction.entry {
            Some(handle) => {
                self.btb.entry_mut(handle).state.update(outcome);
                self.btb.touch(handle);
            },
            // Allocate without training: the branch will be predicted from
            // its own counters the next time it is seen.
            None => {
                let handle = self.btb.insert_or_evict(pc);
                self.btb.touch(handle);
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn step<P: BranchPredictor>(p: &mut P, pc: u64, outcome: Outcome)
        -> P::Prediction
    {
        let pred = p.predict(pc);
        p.update(pc, pred, outcome);
        pred
    }

    #[test]
    fn shared_miss_uses_shared_table() {
        let mut p = LocalSharedPredictor::new(8, 3);

        // Train shared counter 0 towards 'taken' with one branch...
        let first = step(&mut p, 0x100, Outcome::T);
        assert!(!first.hit);
        assert_eq!(first.outcome, Outcome::N);
        assert_eq!(p.table().get_entry(0).value(), 2);

        // ...and a different branch which misses is predicted from the
        // same (already trained) counter.
        let pred = step(&mut p, 0x204, Outcome::T);
        assert!(!pred.hit);
        assert_eq!(pred.outcome, Outcome::T);
        assert_eq!(p.table().get_entry(0).value(), 3);
    }

    #[test]
    fn shared_history_is_per_branch() {
        let mut p = LocalSharedPredictor::new(8, 3);
        step(&mut p, 0x100, Outcome::T);
        step(&mut p, 0x100, Outcome::T);
        let h = p.btb().lookup(0x100).unwrap();
        assert_eq!(p.btb().entry(h).state.as_index(), 0b11);

        step(&mut p, 0x204, Outcome::N);
        let h = p.btb().lookup(0x204).unwrap();
        assert_eq!(p.btb().entry(h).state.as_index(), 0b0);

        let pred = step(&mut p, 0x100, Outcome::T);
        assert!(pred.hit);
        assert_eq!(pred.outcome, Outcome::N);
        assert_eq!(p.table().get_entry(0b11).value(), 2);
    }

    #[test]
    fn private_tables_are_independent() {
        let mut p = LocalPrivatePredictor::new(8, 2, MissPolicy::Allocate);
        for _ in 0..4 {
            step(&mut p, 0x100, Outcome::T);
        }
        // A new branch starts with a fresh table.
        let pred = step(&mut p, 0x204, Outcome::T);
        assert!(!pred.hit);
        assert_eq!(pred.outcome, Outcome::N);

        let h = p.btb().lookup(0x204).unwrap();
        let values: Vec<u8> = p.btb().entry(h).state.pht.counters().iter()
            .map(|c| c.value()).collect();
        assert_eq!(values, vec![2, 1, 1, 1]);
    }

    #[test]
    fn predict_taken_on_miss_allocates_without_training() {
        let mut p = LocalPrivatePredictor::new(8, 3, MissPolicy::PredictTaken);
        let pred = step(&mut p, 0x100, Outcome::N);
        assert_eq!(pred.outcome, Outcome::T);
        assert!(pred.entry.is_none());

        let h = p.btb().lookup(0x100).unwrap();
        let entry = &p.btb().entry(h).state;
        assert_eq!(entry.history.as_index(), 0);
        assert!(entry.pht.counters().iter().all(|c| c.value() == 1));

        // The next occurrence hits and uses the untouched counters.
        let pred = step(&mut p, 0x100, Outcome::N);
        assert!(pred.hit);
        assert_eq!(pred.outcome, Outcome::N);
    }

    #[test]
    fn eviction_resets_private_counters() {
        // A single set: the third branch evicts the first.
        let mut p = LocalPrivatePredictor::new(2, 1, MissPolicy::Allocate);
        for _ in 0..3 { step(&mut p, 0x10, Outcome::T); }
        step(&mut p, 0x20, Outcome::N);
        step(&mut p, 0x30, Outcome::N);
        assert!(p.btb().lookup(0x10).is_none());

        let pred = step(&mut p, 0x10, Outcome::T);
        assert!(!pred.hit);
        assert_eq!(pred.outcome, Outcome::N);
    }
}
