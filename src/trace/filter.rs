//! Reducing a raw simulator log to a filtered trace.
//!
//! The filtered trace keeps only the lines for conditional branch
//! instructions, each followed by the line that came right after it in the
//! raw log. Lines are handled as raw bytes and need not be valid UTF-8.

use std::fs::File;
use std::io::{ BufRead, BufReader, BufWriter, Write };
use std::path::Path;
use std::sync::OnceLock;

use regex::bytes::Regex;

use crate::error::*;

/// Conditional branch mnemonics (including the compare-with-zero forms).
pub const BRANCH_MNEMONICS: &[&str] = &[
    "beq", "beqz", "bne", "bnez", "blt", "bge", "bgtz", "blez", "bltz",
    "bgez", "bltu", "bgeu",
];

fn branch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pat = format!(r"(?-u:\b)({})(?-u:\b)", BRANCH_MNEMONICS.join("|"));
        Regex::new(&pat).expect("mnemonic pattern is valid")
    })
}

/// Returns 'true' if the line contains a conditional branch mnemonic.
pub fn is_branch_line(line: &[u8]) -> bool {
    branch_regex().is_match(line)
}

/// Counts collected while filtering a trace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Number of lines read from the raw log
    pub lines_read: usize,
    /// Number of branch lines found
    pub branches: usize,
    /// Number of lines written to the filtered trace
    pub lines_written: usize,
}

/// Copy branch lines (and the line following each one) from `reader` into
/// `writer`.
///
/// A branch line that directly follows another branch line is written
/// twice: once as the successor of the first branch, and once as a branch
/// in its own right.
pub fn filter_lines<R: BufRead, W: Write>(reader: R, mut writer: W)
    -> std::io::Result<FilterStats>
{
    let mut stats = FilterStats::default();
    let mut write_next = false;
    for line in reader.split(b'\n') {
        let line = line?;
        stats.lines_read += 1;
        if write_next {
            writer.write_all(&line)?;
            writer.write_all(b"\n")?;
            stats.lines_written += 1;
            write_next = false;
        }
        if is_branch_line(&line) {
            writer.write_all(&line)?;
            writer.write_all(b"\n")?;
            stats.lines_written += 1;
            stats.branches += 1;
            write_next = true;
        }
    }
    writer.flush()?;
    Ok(stats)
}

/// Filter the raw log at `input`, writing the result to `output`.
pub fn filter_file(input: &Path, output: &Path) -> Result<FilterStats> {
    let reader = File::open(input).map(BufReader::new)
        .map_err(|e| Error::io(input, e))?;
    let writer = File::create(output).map(BufWriter::new)
        .map_err(|e| Error::io(output, e))?;

    let stats = filter_lines(reader, writer).map_err(|e| Error::io(input, e))?;
    log::info!("filtered {} -> {}: {} branches in {} lines",
        input.display(), output.display(), stats.branches, stats.lines_read);
    Ok(stats)
}

/// Filter the raw log at `input` into memory.
pub fn filter_to_vec(input: &Path) -> Result<(Vec<u8>, FilterStats)> {
    let reader = File::open(input).map(BufReader::new)
        .map_err(|e| Error::io(input, e))?;
    let mut out = Vec::new();
    let stats = filter_lines(reader, &mut out).map_err(|e| Error::io(input, e))?;
    log::info!("filtered {}: {} branches in {} lines",
        input.display(), stats.branches, stats.lines_read);
    Ok((out, stats))
}

#[cfg(test)]
mod test {
    use super::*;

    const RAW: &str = "\
Info 'riscvOVPsim/cpu', 0x0000000080000100(main): 00000513 li a0,0
Info 'riscvOVPsim/cpu', 0x0000000080000104(main+4): 00b50463 beq a0,a1,8000010c
Info 'riscvOVPsim/cpu', 0x000000008000010c(main+c): 00100593 li a1,1
Info 'riscvOVPsim/cpu', 0x0000000080000110(main+10): fe0518e3 bnez a0,80000100
Info 'riscvOVPsim/cpu', 0x0000000080000114(main+14): 00c5d463 bge a1,a2,8000011c
Info 'riscvOVPsim/cpu', 0x000000008000011c(main+1c): 00008067 ret
";

    #[test]
    fn detects_mnemonics() {
        assert!(is_branch_line(b"... 00b50463 beq a0,a1,8000010c"));
        assert!(is_branch_line(b"... 00c5f463 bgeu a1,a2,8000011c"));
        assert!(!is_branch_line(b"... 00008067 ret"));
        assert!(!is_branch_line(b"... 00000513 li a0,0"));
        // Mnemonics only count as whole words
        assert!(!is_branch_line(b"Info 'riscvOVPsim/cpu', 0x10(bgexyz+4): jal"));
    }

    #[test]
    fn keeps_branch_and_successor() {
        let mut out = Vec::new();
        let stats = filter_lines(RAW.as_bytes(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let addrs: Vec<u64> = text.lines()
            .map(|l| crate::trace::parse_address(l).unwrap())
            .collect();
        assert_eq!(addrs, vec![
            0x8000_0104, 0x8000_010c,
            0x8000_0110, 0x8000_0114,
            0x8000_0114, 0x8000_011c,
        ]);
        assert_eq!(stats, FilterStats {
            lines_read: 6, branches: 3, lines_written: 6,
        });
    }

    #[test]
    fn passes_through_program_output() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"Info 'riscvOVPsim/cpu', 0x0000000080000104(main+4): 00b50463 beq a0,a1,8000010c\n");
        raw.extend_from_slice(b"Hello from program \xe9\n");
        raw.extend_from_slice(b"caf\xe9 bne \xff\n");
        raw.extend_from_slice(b"Info 'riscvOVPsim/cpu', 0x0000000080000200(main+100): 00008067 ret\n");

        let mut out = Vec::new();
        let stats = filter_lines(&raw[..], &mut out).unwrap();
        assert_eq!(stats, FilterStats {
            lines_read: 4, branches: 2, lines_written: 4,
        });
        // Raw bytes are copied unchanged
        assert_eq!(out, raw);
    }
}
