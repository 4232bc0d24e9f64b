//! Implementations of different branch predictors.

pub mod table;
pub mod simple;
pub mod pht;
pub mod counter;
pub mod btb;
pub mod global;
pub mod local;
pub mod tournament;

pub use table::*;
pub use simple::*;
pub use pht::*;
pub use counter::*;
pub use btb::*;
pub use global::*;
pub use local::*;
pub use tournament::*;

use crate::Outcome;

/// Interface to a predictor with some internal state which is only subject to
/// change by the correct branch outcome.
pub trait StatefulPredictor {
    fn name(&self) -> &'static str;

    /// Reset the internal state of the predictor.
    fn reset(&mut self);

    /// Return the current predicted outcome.
    fn predict(&self) -> Outcome;

    /// Update the internal state of the predictor with the correct outcome.
    fn update(&mut self, outcome: Outcome);
}

/// Output from [`BranchPredictor::predict`], carrying the predicted outcome
/// and whatever the predictor needs to remember in order to train the state
/// that produced it.
pub trait Prediction: Copy + std::fmt::Debug {
    /// The predicted direction.
    fn outcome(&self) -> Outcome;
}

impl Prediction for Outcome {
    fn outcome(&self) -> Outcome { *self }
}

/// Interface to a direction predictor driven by a stream of branches.
///
/// For each branch, the caller makes a prediction and then (once the branch
/// is resolved) hands the same prediction back along with the correct
/// outcome. Calls are never interleaved across branches.
pub trait BranchPredictor {
    type Prediction: Prediction;

    fn name(&self) -> &'static str;

    /// Make a prediction for the branch at `pc`.
    fn predict(&mut self, pc: u64) -> Self::Prediction;

    /// Update the predictor with the correct outcome for the branch at `pc`.
    fn update(&mut self, pc: u64, prediction: Self::Prediction, outcome: Outcome);
}
