
use rand::prelude::*;

use crate::Outcome;
use crate::predictor::BranchPredictor;

/// A simple predictor with no state: always predict 'taken'.
#[derive(Clone, Copy, Debug, Default)]
pub struct TakenPredictor;
impl BranchPredictor for TakenPredictor {
    type Prediction = Outcome;
    fn name(&self) -> &'static str { "TakenPredictor" }
    fn predict(&mut self, _pc: u64) -> Outcome { Outcome::T }
    fn update(&mut self, _pc: u64, _p: Outcome, _outcome: Outcome) {}
}

/// A simple predictor with no state: always predict 'not-taken'.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotTakenPredictor;
impl BranchPredictor for NotTakenPredictor {
    type Prediction = Outcome;
    fn name(&self) -> &'static str { "NotTakenPredictor" }
    fn predict(&mut self, _pc: u64) -> Outcome { Outcome::N }
    fn update(&mut self, _pc: u64, _p: Outcome, _outcome: Outcome) {}
}

/// A simple predictor which randomly predicts an outcome.
///
/// The generator is seeded so that repeated runs over the same trace agree.
#[derive(Clone, Debug)]
pub struct RandomPredictor {
    rng: StdRng,
}
impl RandomPredictor {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}
impl BranchPredictor for RandomPredictor {
    type Prediction = Outcome;
    fn name(&self) -> &'static str { "RandomPredictor" }
    fn predict(&mut self, _pc: u64) -> Outcome { self.rng.gen::<bool>().into() }
    fn update(&mut self, _pc: u64, _p: Outcome, _outcome: Outcome) {}
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn random_is_reproducible() {
        let mut a = RandomPredictor::new(42);
        let mut b = RandomPredictor::new(42);
        let xs: Vec<Outcome> = (0..64).map(|i| a.predict(i)).collect();
        let ys: Vec<Outcome> = (0..64).map(|i| b.predict(i)).collect();
        assert_eq!(xs, ys);
        assert!(xs.contains(&Outcome::T) && xs.contains(&Outcome::N));
    }

    #[test]
    fn static_predictors() {
        assert_eq!(TakenPredictor.predict(0), Outcome::T);
        assert_eq!(NotTakenPredictor.predict(0), Outcome::N);
    }
}
