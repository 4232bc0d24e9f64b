//! Types for implementing a table of predictors.

/// Interface to a table of predictors.
pub trait PredictorTable {
    /// The type of input to the table used to form an index.
    type Input;

    /// The type of an index into the table.
    type Index;

    /// The type of entry in the table.
    type Entry;

    /// Returns the number of entries in the table.
    fn size(&self) -> usize;

    /// Given some input, return the corresponding index into the table.
    fn get_index(&self, input: Self::Input) -> Self::Index;

    /// Returns a reference to an entry in the table.
    fn get_entry(&self, idx: Self::Index) -> &Self::Entry;

    /// Returns a mutable reference to an entry in the table.
    fn get_entry_mut(&mut self, idx: Self::Index) -> &mut Self::Entry;

    /// Returns a bitmask corresponding to the number of entries in the table.
    fn index_mask(&self) -> usize {
        assert!(self.size().is_power_of_two());
        self.size() - 1
    }
}

/// Interface to a *tagged* table of predictors.
pub trait TaggedPredictorTable: PredictorTable {
    fn get_tag(&self, input: Self::Input) -> u64;
}

/// Splits a branch address into a set index (low bits) and a tag (all of
/// the remaining high bits).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressCodec {
    index_bits: u32,
}
impl AddressCodec {
    pub fn new(index_bits: u32) -> Self {
        assert!(index_bits < u64::BITS);
        Self { index_bits }
    }

    /// Create a codec for a table with `entries` entries spread over sets
    /// of `ways` entries each.
    pub fn for_geometry(entries: usize, ways: usize) -> Self {
        let sets = entries / ways;
        assert!(sets.is_power_of_two(), "set count must be a power of two");
        Self::new(sets.ilog2())
    }

    pub fn index_bits(&self) -> u32 { self.index_bits }

    pub fn index(&self, address: u64) -> u64 {
        address & ((1u64 << self.index_bits) - 1)
    }

    pub fn tag(&self, address: u64) -> u64 {
        address >> self.index_bits
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn split_address() {
        let codec = AddressCodec::for_geometry(2048, 2);
        assert_eq!(codec.index_bits(), 10);
        let addr = 0x8000_1234;
        assert_eq!(codec.index(addr), 0x234);
        assert_eq!(codec.tag(addr), 0x8000_1234 >> 10);
        assert_eq!((codec.tag(addr) << 10) | codec.index(addr), addr);
    }

    #[test]
    fn zero_index_bits() {
        let codec = AddressCodec::new(0);
        assert_eq!(codec.index(0xdead_beef), 0);
        assert_eq!(codec.tag(0xdead_beef), 0xdead_beef);
    }
}
