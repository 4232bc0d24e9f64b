//! A set-associative branch target buffer (BTB) holding per-branch state.
//!
//! Here the BTB does not cache target addresses. Each entry is identified by
//! the tag of a branch address and carries some per-branch predictor state
//! (ie. a local history register, and possibly private counters).
//! Each set holds two entries and a single LRU bit.

use crate::history::HistoryRegister;
use crate::predictor::*;

/// Number of entries in each set.
const WAYS: usize = 2;

/// State carried by a [BTBEntry] which is cleared when the entry is
/// reallocated to a different branch.
pub trait EntryState: Clone {
    fn reset(&mut self);
}

impl EntryState for HistoryRegister {
    fn reset(&mut self) { HistoryRegister::reset(self) }
}

/// A single entry in a [BranchTargetBuffer].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BTBEntry<S> {
    /// Identifies the branch occupying this entry
    pub tag: u64,
    /// Set when the entry has been allocated
    pub valid: bool,
    /// Per-branch predictor state
    pub state: S,
}
impl<S: EntryState> BTBEntry<S> {
    fn matches(&self, tag: u64) -> bool {
        self.valid && self.tag == tag
    }

    /// Reallocate this entry to the branch with the given tag.
    fn reallocate(&mut self, tag: u64) {
        self.tag = tag;
        self.valid = true;
        self.state.reset();
    }
}

/// One set of a 2-way [BranchTargetBuffer].
#[derive(Clone, Debug)]
pub struct BTBSet<S> {
    ways: [BTBEntry<S>; WAYS],
    /// The way which will be replaced next
    lru: usize,
}
impl<S> BTBSet<S> {
    pub const WAYS: usize = WAYS;

    pub fn ways(&self) -> &[BTBEntry<S>] { &self.ways }
}

/// Identifies a particular entry in a [BranchTargetBuffer].
///
/// A handle is only meaningful until the next call to
/// [BranchTargetBuffer::insert_or_evict] on the same set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BTBHandle {
    pub set: usize,
    pub way: usize,
}

/// Result of [BranchTargetBuffer::lookup_or_insert].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BTBAccess {
    /// The branch was already resident
    Hit(BTBHandle),
    /// The branch was missing and a (reset) entry was allocated for it
    Miss(BTBHandle),
}
impl BTBAccess {
    pub fn handle(&self) -> BTBHandle {
        match self {
            Self::Hit(h) | Self::Miss(h) => *h,
        }
    }
    pub fn is_hit(&self) -> bool { matches!(self, Self::Hit(_)) }
}

/// A 2-way set-associative table of per-branch state.
#[derive(Clone, Debug)]
pub struct BranchTargetBuffer<S> {
    codec: AddressCodec,
    sets: Vec<BTBSet<S>>,
}
impl<S: EntryState> BranchTargetBuffer<S> {
    /// Create a BTB with `entries` total entries. Every entry starts out
    /// invalid, holding a copy of `init`.
    pub fn new(entries: usize, init: S) -> Self {
        let ways = BTBSet::<S>::WAYS;
        assert!(entries >= ways && (entries / ways).is_power_of_two(),
            "BTB entries must be a power of two (at least {})", ways);

        let entry = BTBEntry { tag: 0, valid: false, state: init };
        let set = BTBSet {
            ways: [entry.clone(), entry],
            lru: 0,
        };
        Self {
            codec: AddressCodec::for_geometry(entries, ways),
            sets: vec![set; entries / ways],
        }
    }

    pub fn codec(&self) -> &AddressCodec { &self.codec }
    pub fn num_sets(&self) -> usize { self.sets.len() }

    /// Find the entry for the branch at `address`, if it is resident.
    pub fn lookup(&self, address: u64) -> Option<BTBHandle> {
        let set = self.get_index(address);
        let tag = self.get_tag(address);
        self.sets[set].ways.iter()
            .position(|e| e.matches(tag))
            .map(|way| BTBHandle { set, way })
    }

    /// Allocate an entry for the branch at `address` by replacing the
    /// least-recently-used entry in its set. The new entry is valid and its
    /// state is reset.
    pub fn insert_or_evict(&mut self, address: u64) -> BTBHandle {
        let set = self.get_index(address);
        let tag = self.get_tag(address);
        let way = self.sets[set].lru;
        self.sets[set].ways[way].reallocate(tag);
        BTBHandle { set, way }
    }

    /// Find the entry for `address`, allocating one on a miss.
    pub fn lookup_or_insert(&mut self, address: u64) -> BTBAccess {
        match self.lookup(address) {
            Some(handle) => BTBAccess::Hit(handle),
            None => BTBAccess::Miss(self.insert_or_evict(address)),
        }
    }

    /// Mark an entry as most-recently-used: the other entry in the set
    /// becomes the next replacement candidate.
    pub fn touch(&mut self, handle: BTBHandle) {
        self.sets[handle.set].lru = (handle.way + 1) % BTBSet::<S>::WAYS;
    }

    pub fn entry(&self, handle: BTBHandle) -> &BTBEntry<S> {
        &self.sets[handle.set].ways[handle.way]
    }

    pub fn entry_mut(&mut self, handle: BTBHandle) -> &mut BTBEntry<S> {
        &mut self.sets[handle.set].ways[handle.way]
    }
}

impl<S: EntryState> PredictorTable for BranchTargetBuffer<S> {
    type Input = u64;
    type Index = usize;
    type Entry = BTBSet<S>;

    fn size(&self) -> usize { self.sets.len() }

    // With the codec sized to the number of sets, the modulo never aliases.
    fn get_index(&self, address: u64) -> usize {
        (self.codec.index(address) as usize) % self.sets.len()
    }

    fn get_entry(&self, idx: usize) -> &BTBSet<S> {
        &self.sets[idx]
    }

    fn get_entry_mut(&mut self, idx: usize) -> &mut BTBSet<S> {
        &mut self.sets[idx]
    }
}

impl<S: EntryState> TaggedPredictorTable for BranchTargetBuffer<S> {
    fn get_tag(&self, address: u64) -> u64 {
        self.codec.tag(address)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn resident_tags(btb: &BranchTargetBuffer<HistoryRegister>, set: usize)
        -> Vec<u64>
    {
        let mut tags: Vec<u64> = btb.get_entry(set).ways().iter()
            .filter(|e| e.valid)
            .map(|e| e.tag)
            .collect();
        tags.sort();
        tags
    }

    #[test]
    fn miss_then_hit() {
        let mut btb = BranchTargetBuffer::new(8, HistoryRegister::new(3));
        assert_eq!(btb.num_sets(), 4);
        assert!(btb.lookup(0x1001).is_none());

        let h = btb.insert_or_evict(0x1001);
        btb.touch(h);
        assert_eq!(btb.lookup(0x1001), Some(h));
        assert_eq!(h.set, 1);
        assert_eq!(btb.entry(h).tag, 0x1001 >> 2);
        assert!(btb.lookup_or_insert(0x1001).is_hit());
    }

    #[test]
    fn lru_evicts_oldest() {
        let mut btb = BranchTargetBuffer::new(8, HistoryRegister::new(3));
        // Three distinct tags which all map onto set 0
        let (a, b, c) = (0x000, 0x100, 0x200);
        for addr in [a, b, c] {
            let h = btb.insert_or_evict(addr);
            btb.touch(h);
        }
        let set = btb.get_index(a);
        assert_eq!(resident_tags(&btb, set),
            vec![btb.get_tag(b), btb.get_tag(c)]);
        assert!(btb.lookup(a).is_none());
        assert!(btb.lookup(b).is_some());
        assert!(btb.lookup(c).is_some());
    }

    #[test]
    fn touch_protects_entry() {
        let mut btb = BranchTargetBuffer::new(2, HistoryRegister::new(3));
        let ha = btb.insert_or_evict(0x10);
        btb.touch(ha);
        let hb = btb.insert_or_evict(0x20);
        btb.touch(hb);

        // Reuse 'a' so that 'b' becomes the victim
        btb.touch(btb.lookup(0x10).unwrap());
        let hc = btb.insert_or_evict(0x30);
        assert_eq!(hc, hb);
        assert!(btb.lookup(0x10).is_some());
        assert!(btb.lookup(0x20).is_none());
    }

    #[test]
    fn sets_do_not_overflow() {
        let mut btb = BranchTargetBuffer::new(4, HistoryRegister::new(1));
        for addr in [0x0, 0x2, 0x4] {
            let h = btb.insert_or_evict(addr);
            btb.touch(h);
        }
        // Set 1 is still empty, but the first branch was evicted from set 0
        assert!(btb.get_entry(1).ways().iter().all(|e| !e.valid));
        assert!(btb.lookup(0x0).is_none());
    }

    #[test]
    fn reallocation_resets_state() {
        let mut btb = BranchTargetBuffer::new(2, HistoryRegister::new(3));
        let h = btb.insert_or_evict(0x10);
        btb.entry_mut(h).state.update(crate::Outcome::T);
        assert_eq!(btb.entry(h).state.as_index(), 1);
        btb.touch(h);
        let h = btb.insert_or_evict(0x20);
        btb.touch(h);
        let h = btb.insert_or_evict(0x30);
        assert_eq!(btb.entry(h).state.as_index(), 0);
        assert_eq!(btb.entry(h).tag, 0x30);
    }
}
