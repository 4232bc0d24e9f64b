//! Reading branch events from a text trace.
//!
//! A filtered trace alternates between two kinds of lines: a line for an
//! executed branch instruction, followed by a line for the instruction that
//! executed right after it. Each line carries the address of an instruction:
//!
//! ```text
//! Info 'riscvOVPsim/cpu', 0x0000000080000104(main+24): 00b50463 beq a0,a1,8000010c
//! Info 'riscvOVPsim/cpu', 0x000000008000010c(main+2c): 00000513 li a0,0
//! ```

pub mod filter;

pub use filter::*;

use std::fs::File;
use std::io::{ BufRead, BufReader };
use std::path::{ Path, PathBuf };
use std::sync::OnceLock;

use regex::Regex;

use crate::branch::*;
use crate::error::*;

fn address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*Info 'riscvOVPsim/cpu', 0x([0-9a-fA-F]+)")
            .expect("address pattern is valid")
    })
}

/// Parse the instruction address from a single trace line.
pub fn parse_address(line: &str) -> Option<u64> {
    let caps = address_regex().captures(line)?;
    u64::from_str_radix(&caps[1], 16).ok()
}

/// What to do with a trace line that does not contain an address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Drop the branch event the line belongs to and keep going
    Skip,
    /// Stop reading the trace with [Error::MalformedTraceLine]
    #[default]
    Abort,
}

impl std::str::FromStr for MalformedPolicy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            _ => Err(format!("expected 'skip' or 'abort', got {:?}", s)),
        }
    }
}

/// State of the line pairing state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PairState {
    /// The next line is a branch instruction
    AwaitBranch,
    /// The next line is the successor of the branch at this address
    AwaitNext(u64),
    /// The next line is the successor of a malformed branch line
    DiscardNext,
}

/// An iterator over [BranchEvent]s built from pairs of raw trace lines.
///
/// Blank lines are ignored. A trailing branch line without a successor is
/// dropped. Lines need not be valid UTF-8: a line without an address is
/// malformed regardless of its encoding.
pub struct BranchEvents<L> {
    lines: L,
    path: PathBuf,
    state: PairState,
    policy: MalformedPolicy,
    line_no: usize,
    skipped: usize,
    done: bool,
}

impl<L: Iterator<Item = std::io::Result<Vec<u8>>>> BranchEvents<L> {
    pub fn new(lines: L, policy: MalformedPolicy) -> Self {
        Self {
            lines,
            path: PathBuf::new(),
            state: PairState::AwaitBranch,
            policy,
            line_no: 0,
            skipped: 0,
            done: false,
        }
    }

    /// Attach a path used when reporting I/O errors.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped(&self) -> usize { self.skipped }

    /// Number of lines read so far.
    pub fn lines_read(&self) -> usize { self.line_no }

    /// Handle a line without an address. Returns an error when the policy
    /// says to abort.
    fn malformed(&mut self, text: String) -> Option<Error> {
        match self.policy {
            MalformedPolicy::Abort => {
                self.done = true;
                Some(Error::MalformedTraceLine { line: self.line_no, text })
            },
            MalformedPolicy::Skip => {
                log::warn!("skipping malformed trace line {}: {:?}",
                    self.line_no, text);
                self.skipped += 1;
                None
            },
        }
    }
}

impl<L: Iterator<Item = std::io::Result<Vec<u8>>>> Iterator for BranchEvents<L> {
    type Item = Result<BranchEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let raw = match self.lines.next() {
                Some(Ok(raw)) => raw,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(Error::io(&self.path, e)));
                },
                None => break,
            };
            self.line_no += 1;
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let address = parse_address(line);
            match (self.state, address) {
                (PairState::AwaitBranch, Some(addr)) => {
                    self.state = PairState::AwaitNext(addr);
                },
                (PairState::AwaitBranch, None) => {
                    self.state = PairState::DiscardNext;
                    if let Some(e) = self.malformed(line.to_string()) {
                        return Some(Err(e));
                    }
                },
                (PairState::AwaitNext(branch), Some(next)) => {
                    self.state = PairState::AwaitBranch;
                    return Some(Ok(BranchEvent::new(branch, next)));
                },
                (PairState::AwaitNext(_), None) => {
                    self.state = PairState::AwaitBranch;
                    if let Some(e) = self.malformed(line.to_string()) {
                        return Some(Err(e));
                    }
                },
                (PairState::DiscardNext, _) => {
                    self.state = PairState::AwaitBranch;
                },
            }
        }

        if let PairState::AwaitNext(addr) = self.state {
            log::debug!("dropping unmatched branch at {:#x} (line {})",
                addr, self.line_no);
            self.state = PairState::AwaitBranch;
        }
        self.done = true;
        None
    }
}

/// Branch events read from a trace file.
pub type FileEvents = BranchEvents<std::io::Split<BufReader<File>>>;

/// Read branch events from any buffered source of trace lines.
pub fn events_from_reader<R: BufRead>(reader: R, policy: MalformedPolicy)
    -> BranchEvents<std::io::Split<R>>
{
    BranchEvents::new(reader.split(b'\n'), policy)
}

/// Open a filtered trace file.
pub fn open_trace(path: &Path, policy: MalformedPolicy) -> Result<FileEvents> {
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    Ok(events_from_reader(BufReader::new(f), policy).with_path(path))
}
