//! Helpers for collecting statistics.

use std::collections::*;
use bitvec::prelude::*;
use itertools::*;

use crate::branch::*;

/// Container for recording statistics while evaluating a predictor over a
/// single trace.
#[derive(Clone, Debug, Default)]
pub struct TraceStats {
    /// Per-branch data (indexed by branch address)
    pub data: BTreeMap<u64, BranchData>,

    /// Number of branches evaluated
    pub total_branches: u64,

    /// Number of incorrect predictions
    pub mispredictions: u64,
}
impl TraceStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the prediction made for some branch. Returns 'true' if the
    /// prediction was correct.
    pub fn record(&mut self, event: &BranchEvent, prediction: Outcome) -> bool {
        let outcome = event.outcome();
        let hit = prediction == outcome;
        self.total_branches += 1;
        if !hit { self.mispredictions += 1; }

        let data = self.get_mut(event.branch_address);
        data.occ += 1;
        data.pat.push(outcome.into());
        if hit { data.hits += 1; }
        hit
    }

    /// Return the total branch count.
    pub fn total_branches(&self) -> u64 { self.total_branches }

    /// Return the number of mispredictions.
    pub fn mispredictions(&self) -> u64 { self.mispredictions }

    /// Return the number of correct predictions.
    pub fn hits(&self) -> u64 { self.total_branches - self.mispredictions }

    /// Return the fraction of mispredicted branches, or [None] if no
    /// branches were evaluated.
    pub fn misprediction_rate(&self) -> Option<f64> {
        if self.total_branches == 0 {
            return None;
        }
        Some(self.mispredictions as f64 / self.total_branches as f64)
    }

    /// Returns a reference to data collected for a particular branch.
    pub fn get(&self, pc: u64) -> Option<&BranchData> {
        self.data.get(&pc)
    }

    /// Returns a mutable reference to data collected for a particular branch.
    /// Creates a new entry if one doesn't already exist.
    pub fn get_mut(&mut self, pc: u64) -> &mut BranchData {
        self.data.entry(pc).or_default()
    }

    /// Returns the number of unique observed branch instructions.
    pub fn num_unique_branches(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of branches that are always taken
    pub fn num_always_taken(&self) -> usize {
        self.data.values().filter(|d| d.is_always_taken()).count()
    }

    /// Returns the number of branches that are never taken
    pub fn num_never_taken(&self) -> usize {
        self.data.values().filter(|d| d.is_never_taken()).count()
    }

    /// Returns the 'n' most frequently executed branches which are predicted
    /// correctly no more than 55% of the time.
    pub fn get_low_rate_branches(&self, n: usize) -> Vec<(u64, &BranchData)> {
        self.data.iter()
            .filter(|(_, s)| s.hit_rate() <= 0.55)
            .sorted_by(|x, y| x.1.occ.cmp(&y.1.occ).then(y.0.cmp(x.0)))
            .rev()
            .take(n)
            .map(|(pc, s)| (*pc, s))
            .collect()
    }
}

/// Container for per-branch statistics.
#[derive(Clone, Debug, Default)]
pub struct BranchData {
    /// Number of times this branch was encountered.
    pub occ: usize,

    /// Number of correct predictions for this branch.
    pub hits: usize,

    /// Record of all observed outcomes for this branch.
    pub pat: BitVec,
}
impl BranchData {
    /// Return the hit rate for this branch.
    pub fn hit_rate(&self) -> f64 {
        if self.occ == 0 { return 0.0; }
        self.hits as f64 / self.occ as f64
    }

    pub fn is_always_taken(&self) -> bool {
        self.pat.count_ones() == self.pat.len()
    }

    pub fn is_never_taken(&self) -> bool {
        self.pat.count_zeros() == self.pat.len()
    }

    /// Return the most recent outcomes (up to 'n') as a string of 1s and 0s,
    /// oldest first.
    pub fn recent_pattern(&self, n: usize) -> String {
        let start = self.pat.len().saturating_sub(n);
        self.pat[start..].iter().by_vals()
            .map(|b| if b { '1' } else { '0' })
            .collect()
    }
}

/// The summary printed for one predictor over one trace.
pub struct Report<'a> {
    pub predictor: &'a str,
    pub trace: &'a str,
    pub stats: &'a TraceStats,
}
impl std::fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "{} for {}:", self.predictor, self.trace)?;
        writeln!(f, "Total Branches: {}", self.stats.total_branches())?;
        writeln!(f, "Mispredictions: {}", self.stats.mispredictions())?;
        match self.stats.misprediction_rate() {
            Some(rate) => write!(f, "Misprediction Rate: {:.4}", rate * 100.0),
            None => write!(f, "Misprediction Rate: undefined"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_trace_has_no_rate() {
        let stats = TraceStats::new();
        assert_eq!(stats.misprediction_rate(), None);
        let report = Report { predictor: "Global", trace: "t.trc", stats: &stats };
        assert!(report.to_string().ends_with("Misprediction Rate: undefined"));
    }

    #[test]
    fn counts_and_report() {
        let mut stats = TraceStats::new();
        assert!(stats.record(&BranchEvent::new(0x100, 0x104), Outcome::N));
        assert!(!stats.record(&BranchEvent::new(0x100, 0x200), Outcome::N));
        assert!(stats.record(&BranchEvent::new(0x200, 0x300), Outcome::T));

        assert_eq!(stats.total_branches(), 3);
        assert_eq!(stats.mispredictions(), 1);
        assert_eq!(stats.hits(), 2);
        assert_eq!(stats.num_unique_branches(), 2);
        assert_eq!(stats.num_always_taken(), 1);
        assert_eq!(stats.num_never_taken(), 0);

        let d = stats.get(0x100).unwrap();
        assert_eq!((d.occ, d.hits), (2, 1));
        assert_eq!(d.recent_pattern(8), "01");

        let report = Report { predictor: "Global", trace: "t.trc", stats: &stats };
        assert_eq!(report.to_string(), "Global for t.trc:\n\
            Total Branches: 3\n\
            Mispredictions: 1\n\
            Misprediction Rate: 33.3333");
    }

    #[test]
    fn low_rate_branches() {
        let mut stats = TraceStats::new();
        for _ in 0..4 {
            stats.record(&BranchEvent::new(0x100, 0x200), Outcome::N);
        }
        stats.record(&BranchEvent::new(0x300, 0x400), Outcome::N);
        stats.record(&BranchEvent::new(0x500, 0x504), Outcome::N);

        let low = stats.get_low_rate_branches(8);
        assert_eq!(low.iter().map(|(pc, _)| *pc).collect::<Vec<_>>(),
            vec![0x100, 0x300]);
    }
}
