
use bitvec::prelude::*;
use crate::branch::Outcome;

/// A fixed-width shift register recording recent branch outcomes.
///
/// The newest outcome is always bit 0; older outcomes move towards the
/// most-significant end and fall off once they are older than `len` branches.
#[derive(Clone, PartialEq, Eq)]
pub struct HistoryRegister {
    data: BitVec<usize, Lsb0>,
    len: usize,
}

// NOTE: This *reverses* the all of the bits and presents them in a format
// where the leftmost bit is the most-significant (index n) and the rightmost
// bit is the least-significant (index 0).
impl std::fmt::Display for HistoryRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let x: String = self.data.as_bitslice().iter().by_vals()
            .map(|b| if b { '1' } else { '0' })
            .rev()
            .collect();
        write!(f, "{}", x)
    }
}

impl std::fmt::Debug for HistoryRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "HistoryRegister({}b:{})", self.len, self)
    }
}

impl HistoryRegister {
    /// Create a register with the specified length in bits.
    /// All bits in the register are initialized to zero.
    pub fn new(len: usize) -> Self {
        assert!(len <= usize::BITS as usize,
            "history register cannot be wider than {} bits", usize::BITS);
        Self {
            data: bitvec![usize, Lsb0; 0; len],
            len,
        }
    }

    /// Shift the register by 'n' bits.
    /// The bottom 'n' bits become zero, and the top 'n' bits are discarded.
    pub fn shift_by(&mut self, n: usize) {
        self.data.shift_end(n.min(self.len));
    }

    /// Fold the most recent outcome into the bottom of the register.
    pub fn update(&mut self, outcome: Outcome) {
        if self.len == 0 {
            return;
        }
        self.shift_by(1);
        self.data.set(0, outcome.into());
    }

    /// Return the contents of the register as an index into a table with
    /// `2^len` entries.
    pub fn as_index(&self) -> usize {
        if self.len == 0 {
            return 0;
        }
        self.data.load_le::<usize>()
    }

    /// Clear all bits in the register.
    pub fn reset(&mut self) {
        self.data.fill(false);
    }
}
