//! Evaluate a branch predictor against one or more instruction traces.

use std::path::{ Path, PathBuf };
use std::process::ExitCode;

use clap::Parser;

use bpeval::*;
use bpeval::sim::*;
use bpeval::stats::*;

/// Default configuration file, used when it exists in the working directory.
const DEFAULT_CONFIG: &str = "BTBConfiguration.txt";

#[derive(Parser, Debug)]
#[command(name = "bpeval", version, about = "Replay instruction traces through branch predictors")]
struct Cli {
    /// Configuration file with key=value pairs
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Predictor to evaluate (0=local-private, 1=local-shared, 2=global, 3=tournament)
    #[arg(short = 'p', long)]
    predictor: Option<u32>,

    /// Width of the global history register
    #[arg(long)]
    ghr_bits: Option<usize>,

    /// Width of the local history registers
    #[arg(long)]
    bhr_bits: Option<usize>,

    /// Number of BTB entries
    #[arg(long)]
    entries: Option<usize>,

    /// Number of tournament chooser counters
    #[arg(long)]
    chooser_entries: Option<usize>,

    /// What to do with malformed trace lines ("skip" or "abort")
    #[arg(long)]
    on_malformed: Option<MalformedPolicy>,

    /// Treat inputs as raw simulator logs and filter them first
    #[arg(long)]
    filter: bool,

    /// Directory to write filtered traces into (implies --filter)
    #[arg(long)]
    filtered_out: Option<PathBuf>,

    /// Also evaluate the static baseline predictors
    #[arg(long)]
    baselines: bool,

    /// List this many frequently executed, poorly predicted branches
    #[arg(long, default_value_t = 0)]
    top: usize,

    /// Trace files
    #[arg(required = true)]
    traces: Vec<PathBuf>,
}

impl Cli {
    /// Build the configuration: defaults, then the file, then flags.
    fn sim_config(&self) -> Result<SimConfig> {
        let mut cfg = match &self.config {
            Some(path) => SimConfig::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG).exists() => {
                SimConfig::from_file(Path::new(DEFAULT_CONFIG))?
            },
            None => SimConfig::default(),
        };

        if let Some(code) = self.predictor {
            cfg.set("which_predictor", &code.to_string())?;
        }
        if let Some(bits) = self.ghr_bits { cfg.ghr_bits = bits; }
        if let Some(bits) = self.bhr_bits { cfg.bhr_bits = bits; }
        if let Some(n) = self.entries { cfg.entries = n; }
        if let Some(n) = self.chooser_entries { cfg.chooser_entries = n; }
        if let Some(policy) = self.on_malformed { cfg.on_malformed = policy; }
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Filter a raw log, returning the filtered trace.
fn filter_input(cli: &Cli, path: &Path) -> Result<Vec<u8>> {
    let (text, _) = filter_to_vec(path)?;
    if let Some(dir) = &cli.filtered_out {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("trace");
        let out = dir.join(format!("{}_filtered.trc", stem));
        std::fs::write(&out, &text).map_err(|e| Error::io(&out, e))?;
        log::info!("wrote {}", out.display());
    }
    Ok(text)
}

fn print_report(name: &str, trace: &str, stats: &TraceStats, top: usize) {
    println!();
    println!("{}", Report { predictor: name, trace, stats });

    if top == 0 {
        return;
    }
    println!("Unique branches: {} ({} always taken, {} never taken)",
        stats.num_unique_branches(), stats.num_always_taken(),
        stats.num_never_taken());
    println!("Low hit-rate branches:");
    for (pc, data) in stats.get_low_rate_branches(top) {
        println!("  {:016x} {:8}/{:8} {:.4} {}",
            pc, data.hits, data.occ, data.hit_rate(), data.recent_pattern(32)
        );
    }
}

/// Evaluate the configured predictor (and optionally the baselines) over
/// a single trace.
fn evaluate(cli: &Cli, cfg: &SimConfig, path: &Path) -> Result<()> {
    let name = path.display().to_string();
    let filtered = if cli.filter || cli.filtered_out.is_some() {
        Some(filter_input(cli, path)?)
    } else {
        None
    };

    let stats = match &filtered {
        Some(text) => run(cfg, events_from_reader(&text[..], cfg.on_malformed))?,
        None => run_trace_file(cfg, path)?,
    };
    print_report(cfg.predictor.name(), &name, &stats, cli.top);

    if cli.baselines {
        let events: Vec<BranchEvent> = match &filtered {
            Some(text) => events_from_reader(&text[..], cfg.on_malformed)
                .collect::<Result<_>>()?,
            None => open_trace(path, cfg.on_malformed)?
                .collect::<Result<_>>()?,
        };
        for (baseline, stats) in run_baselines(&events)? {
            print_report(baseline, &name, &stats, 0);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let cli = Cli::parse();
    let cfg = match cli.sim_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        },
    };
    log::info!("configuration: {:?}", cfg);

    // A failure on one trace does not stop the others.
    let mut failed = false;
    for path in cli.traces.iter() {
        if let Err(e) = evaluate(&cli, &cfg, path) {
            log::error!("{}: {}", path.display(), e);
            failed = true;
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
