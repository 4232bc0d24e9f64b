//! Types for representing branches and branch outcomes.

/// A branch outcome.
#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    /// Not taken
    N = 0,
    /// Taken
    T = 1
}

impl Outcome {
    pub fn from_bool(b: bool) -> Self {
        match b {
            true => Self::T,
            false => Self::N,
        }
    }

    pub fn is_taken(&self) -> bool { matches!(self, Self::T) }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::T => "t",
            Self::N => "n",
        };
        write!(f, "{}", s)
    }
}

impl std::ops::Not for Outcome {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Self::N => Self::T,
            Self::T => Self::N,
        }
    }
}

impl From<bool> for Outcome {
    fn from(x: bool) -> Self { Self::from_bool(x) }
}
impl From<Outcome> for bool {
    fn from(x: Outcome) -> bool { x.is_taken() }
}

/// Size of every instruction in the traced program (in bytes).
pub const INSTRUCTION_SIZE: u64 = 4;

/// A single executed conditional branch, recovered from a pair of trace
/// lines: the branch instruction itself and the instruction that executed
/// immediately after it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BranchEvent {
    /// Address of the branch instruction
    pub branch_address: u64,

    /// Address of the instruction executed after the branch
    pub next_address: u64,
}
impl BranchEvent {
    pub fn new(branch_address: u64, next_address: u64) -> Self {
        Self { branch_address, next_address }
    }

    /// Returns 'true' unless execution fell through to the next sequential
    /// instruction.
    pub fn is_taken(&self) -> bool {
        self.next_address != self.branch_address.wrapping_add(INSTRUCTION_SIZE)
    }

    /// The resolved direction of this branch.
    pub fn outcome(&self) -> Outcome {
        Outcome::from_bool(self.is_taken())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fallthrough_is_not_taken() {
        assert_eq!(BranchEvent::new(0x100, 0x104).outcome(), Outcome::N);
        assert_eq!(BranchEvent::new(0x100, 0x200).outcome(), Outcome::T);
        // Backward branch to itself
        assert_eq!(BranchEvent::new(0x100, 0x100).outcome(), Outcome::T);
    }

    #[test]
    fn outcome_conversions() {
        assert_eq!(Outcome::from(true), Outcome::T);
        assert!(!bool::from(Outcome::N));
        assert_eq!(!Outcome::T, Outcome::N);
    }
}
