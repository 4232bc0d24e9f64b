//! Simulation parameters and the `key=value` configuration file format.
//!
//! ```text
//! # Branch predictor configuration
//! ghr_bits=6
//! bhr_bits=3
//! entries=2048
//! which_predictor=3
//! ```

use std::path::Path;

use crate::error::*;
use crate::trace::MalformedPolicy;

/// Maximum width of any history register.
pub const MAX_HISTORY_BITS: usize = 16;

/// The branch prediction strategy to evaluate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictorKind {
    LocalPrivate,
    LocalShared,
    Global,
    Tournament,
}
impl PredictorKind {
    pub const ALL: [Self; 4] = [
        Self::LocalPrivate, Self::LocalShared, Self::Global, Self::Tournament,
    ];

    /// The numeric code used by `which_predictor`.
    pub fn code(&self) -> u32 {
        match self {
            Self::LocalPrivate => 0,
            Self::LocalShared => 1,
            Self::Global => 2,
            Self::Tournament => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalPrivate => "LocalPrivate",
            Self::LocalShared => "LocalShared",
            Self::Global => "Global",
            Self::Tournament => "Tournament",
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }
}

/// Parameters for a simulation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimConfig {
    /// Width of the global history register
    pub ghr_bits: usize,

    /// Width of each local history register
    pub bhr_bits: usize,

    /// Number of BTB entries (two per set)
    pub entries: usize,

    /// Strategy to evaluate
    pub predictor: PredictorKind,

    /// Number of counters in the tournament chooser
    pub chooser_entries: usize,

    /// Handling of trace lines without an address
    pub on_malformed: MalformedPolicy,

    /// Keys found in the configuration file which were not recognized
    pub unknown_keys: Vec<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ghr_bits: 6,
            bhr_bits: 3,
            entries: 2048,
            predictor: PredictorKind::Tournament,
            chooser_entries: 1024,
            on_malformed: MalformedPolicy::Abort,
            unknown_keys: Vec::new(),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| Error::InvalidConfigValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl SimConfig {
    /// Read a configuration file. Keys missing from the file keep their
    /// default values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path, e))?;
        let mut cfg = Self::default();
        cfg.apply_str(&text)?;
        Ok(cfg)
    }

    /// Apply every `key=value` line in some configuration text.
    pub fn apply_str(&mut self, text: &str) -> Result<()> {
        for (num, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => self.set(key.trim(), value.trim())?,
                None => log::warn!("ignoring configuration line {}: {:?}",
                    num + 1, line),
            }
        }
        Ok(())
    }

    /// Set a single configuration key. Unknown keys are recorded and
    /// otherwise ignored.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "ghr_bits" => self.ghr_bits = parse_value(key, value)?,
            "bhr_bits" => self.bhr_bits = parse_value(key, value)?,
            "entries" => self.entries = parse_value(key, value)?,
            "chooser_entries" => self.chooser_entries = parse_value(key, value)?,
            "which_predictor" => {
                let code: u32 = parse_value(key, value)?;
                self.predictor = PredictorKind::from_code(code)
                    .ok_or_else(|| Error::InvalidConfigValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    })?;
            },
            "on_malformed" => {
                self.on_malformed = value.parse().map_err(|_| {
                    Error::InvalidConfigValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    }
                })?;
            },
            _ => {
                log::warn!("unknown configuration key: {}", key);
                self.unknown_keys.push(key.to_string());
            },
        }
        Ok(())
    }

    /// Check that the table sizes can be used to build every predictor.
    pub fn validate(&self) -> Result<()> {
        if self.entries < 2 || !self.entries.is_power_of_two() {
            return Err(Error::InvalidGeometry(format!(
                "entries must be a power of two no smaller than 2 (got {})",
                self.entries
            )));
        }
        for (name, bits) in [("ghr_bits", self.ghr_bits), ("bhr_bits", self.bhr_bits)] {
            if bits > MAX_HISTORY_BITS {
                return Err(Error::InvalidGeometry(format!(
                    "{} must be at most {} (got {})",
                    name, MAX_HISTORY_BITS, bits
                )));
            }
        }
        if self.chooser_entries == 0 || !self.chooser_entries.is_power_of_two() {
            return Err(Error::InvalidGeometry(format!(
                "chooser_entries must be a power of two (got {})",
                self.chooser_entries
            )));
        }
        Ok(())
    }
}
