//! Driving a predictor over a stream of branch events.

use std::path::Path;

use crate::branch::*;
use crate::config::*;
use crate::error::*;
use crate::predictor::*;
use crate::stats::*;
use crate::trace::*;

/// Evaluate a predictor over a sequence of branch events.
///
/// For each branch the predictor makes a prediction, the prediction is
/// compared against the resolved outcome, and then the predictor is updated.
/// The first error in the sequence ends the run.
pub fn simulate<P, I>(predictor: &mut P, events: I) -> Result<TraceStats>
where
    P: BranchPredictor,
    I: IntoIterator<Item = Result<BranchEvent>>,
{
    let mut stats = TraceStats::new();
    for event in events {
        let event = event?;
        let pc = event.branch_address;
        let prediction = predictor.predict(pc);
        stats.record(&event, prediction.outcome());
        predictor.update(pc, prediction, event.outcome());
    }
    Ok(stats)
}

/// One of the configurable predictors, built from a [SimConfig].
#[derive(Clone, Debug)]
pub enum Predictor {
    LocalPrivate(LocalPrivatePredictor),
    LocalShared(LocalSharedPredictor),
    Global(GlobalPredictor),
    Tournament(TournamentPredictor),
}
impl Predictor {
    /// Build a predictor in its initial state.
    pub fn build(cfg: &SimConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(match cfg.predictor {
            PredictorKind::LocalPrivate => Self::LocalPrivate(
                LocalPrivatePredictor::new(cfg.entries, cfg.bhr_bits,
                    MissPolicy::Allocate)
            ),
            PredictorKind::LocalShared => Self::LocalShared(
                LocalSharedPredictor::new(cfg.entries, cfg.bhr_bits)
            ),
            PredictorKind::Global => Self::Global(
                GlobalPredictor::new(cfg.ghr_bits)
            ),
            PredictorKind::Tournament => Self::Tournament(
                TournamentPredictor::new(cfg.entries, cfg.bhr_bits,
                    cfg.ghr_bits, cfg.chooser_entries)
            ),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalPrivate(p) => p.name(),
            Self::LocalShared(p) => p.name(),
            Self::Global(p) => p.name(),
            Self::Tournament(p) => p.name(),
        }
    }

    /// Evaluate this predictor over a sequence of branch events.
    pub fn simulate<I>(&mut self, events: I) -> Result<TraceStats>
    where I: IntoIterator<Item = Result<BranchEvent>>
    {
        match self {
            Self::LocalPrivate(p) => simulate(p, events),
            Self::LocalShared(p) => simulate(p, events),
            Self::Global(p) => simulate(p, events),
            Self::Tournament(p) => simulate(p, events),
        }
    }
}

/// Evaluate the configured predictor over some events. Every call starts
/// from a freshly built predictor.
pub fn run<I>(cfg: &SimConfig, events: I) -> Result<TraceStats>
where I: IntoIterator<Item = Result<BranchEvent>>
{
    Predictor::build(cfg)?.simulate(events)
}

/// Evaluate the configured predictor over a filtered trace file.
pub fn run_trace_file(cfg: &SimConfig, path: &Path) -> Result<TraceStats> {
    let mut predictor = Predictor::build(cfg)?;
    let mut events = open_trace(path, cfg.on_malformed)?;
    log::info!("running {} predictor on {}", predictor.name(), path.display());
    let stats = predictor.simulate(events.by_ref())?;
    log::info!("{}: {} branches, {} mispredictions ({} lines, {} skipped)",
        path.display(), stats.total_branches(), stats.mispredictions(),
        events.lines_read(), events.skipped());
    Ok(stats)
}

/// Evaluate the stateless baseline predictors over some events.
pub fn run_baselines(events: &[BranchEvent])
    -> Result<Vec<(&'static str, TraceStats)>>
{
    let stream = || events.iter().copied().map(Ok);
    let mut taken = TakenPredictor;
    let mut not_taken = NotTakenPredictor;
    let mut random = RandomPredictor::new(0);
    Ok(vec![
        (taken.name(), simulate(&mut taken, stream())?),
        (not_taken.name(), simulate(&mut not_taken, stream())?),
        (random.name(), simulate(&mut random, stream())?),
    ])
}

#[cfg(test)]
mod test {
    use super::*;

    fn events(pairs: &[(u64, u64)]) -> Vec<Result<BranchEvent>> {
        pairs.iter().map(|&(a, n)| Ok(BranchEvent::new(a, n))).collect()
    }

    #[test]
    fn global_one_bit_example() {
        let cfg = SimConfig {
            ghr_bits: 1,
            predictor: PredictorKind::Global,
            ..SimConfig::default()
        };
        let stats = run(&cfg, events(&[
            (0x100, 0x104), (0x100, 0x200), (0x100, 0x104),
        ])).unwrap();
        assert_eq!(stats.total_branches(), 3);
        assert_eq!(stats.mispredictions(), 1);
        let rate = stats.misprediction_rate().unwrap() * 100.0;
        assert!((rate - 33.3333).abs() < 1e-3);
    }

    #[test]
    fn runs_do_not_share_state() {
        let cfg = SimConfig::default();
        let trace: Vec<(u64, u64)> = (0..200u64).map(|i| {
            let pc = 0x8000_0000 + (i % 7) * 4;
            let next = if i % 3 == 0 { 0x9000_0000 } else { pc + 4 };
            (pc, next)
        }).collect();
        for kind in PredictorKind::ALL {
            let cfg = SimConfig { predictor: kind, ..cfg.clone() };
            let a = run(&cfg, events(&trace)).unwrap();
            let b = run(&cfg, events(&trace)).unwrap();
            assert_eq!(a.mispredictions(), b.mispredictions(), "{:?}", kind);
            assert_eq!(a.total_branches(), 200);
            assert_eq!(Predictor::build(&cfg).unwrap().name(), kind.name());
        }
    }

    #[test]
    fn error_stops_the_run() {
        let mut p = GlobalPredictor::new(2);
        let mut evs = events(&[(0x100, 0x104)]);
        evs.push(Err(Error::MalformedTraceLine { line: 3, text: "x".into() }));
        evs.extend(events(&[(0x100, 0x104)]));
        assert!(matches!(simulate(&mut p, evs),
            Err(Error::MalformedTraceLine { line: 3, .. })));
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let cfg = SimConfig { entries: 3, ..SimConfig::default() };
        assert!(matches!(Predictor::build(&cfg), Err(Error::InvalidGeometry(_))));
    }

    #[test]
    fn baselines() {
        let evs = [BranchEvent::new(0x100, 0x104), BranchEvent::new(0x100, 0x200)];
        let res = run_baselines(&evs).unwrap();
        assert_eq!(res.len(), 3);
        assert_eq!(res[0].0, "TakenPredictor");
        assert_eq!(res[0].1.mispredictions(), 1);
        assert_eq!(res[1].1.mispredictions(), 1);
        assert_eq!(res[2].1.total_branches(), 2);
    }
}
