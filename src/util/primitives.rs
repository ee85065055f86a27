/*!
Integer newtypes used as handles throughout the crate.

All of these are thin wrappers around `u32`. Using `u32` instead of `usize`
halves the memory footprint of NFA nodes and DFA transition tables on 64-bit
targets, and the arenas indexed by these handles never grow anywhere near
`u32::MAX` entries.
*/

/// The identifier of an NFA expression node.
///
/// An `ExprId` is an index into the expression arena built at compile time.
/// Equality of NFA nodes is equality of their ids; two structurally equal
/// nodes allocated separately (for example by `rename`) are distinct.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[repr(transparent)]
pub(crate) struct ExprId(u32);

impl ExprId {
    #[inline]
    pub(crate) const fn new(id: usize) -> ExprId {
        ExprId(id as u32)
    }

    #[inline]
    pub(crate) const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// The identifier of a lazily constructed DFA state.
///
/// This is an index into the DFA state vector owned by the transition
/// cache. Index `0` is reserved for the shared "unknown" sentinel state
/// that fills every freshly allocated transition table.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(transparent)]
pub(crate) struct StateID(u32);

impl StateID {
    /// The id of the shared sentinel state standing in for transitions that
    /// have not been computed yet.
    pub(crate) const UNKNOWN: StateID = StateID(0);

    #[inline]
    pub(crate) fn new(id: usize) -> StateID {
        debug_assert!(id <= u32::MAX as usize);
        StateID(id as u32)
    }

    #[inline]
    pub(crate) fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A capture mark.
///
/// Each capturing group owns two consecutive marks: `2g` records where the
/// group started and `2g + 1` where it stopped. A mark's value at match
/// time is a slot in the position array.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[repr(transparent)]
pub(crate) struct Mark(u32);

impl Mark {
    #[inline]
    pub(crate) fn new(id: usize) -> Mark {
        debug_assert!(id <= u32::MAX as usize);
        Mark(id as u32)
    }

    #[inline]
    pub(crate) fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A priority mark.
///
/// Priority marks are user supplied tags attached to a sub-pattern with
/// [`mark`](crate::mark). After a successful match, the set of priority
/// marks carried by the winning thread identifies which alternatives fired.
///
/// `Pmark` values are drawn from a global monotonic counter, so marks
/// created for different patterns never collide.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Pmark(u32);

impl Pmark {
    /// Returns a fresh priority mark, distinct from all previous ones.
    pub(crate) fn fresh() -> Pmark {
        use core::sync::atomic::{AtomicU32, Ordering};

        static NEXT: AtomicU32 = AtomicU32::new(0);
        let id = NEXT.fetch_add(1, Ordering::Relaxed);
        assert!(id < u32::MAX, "exhausted priority mark identifiers");
        Pmark(id)
    }
}

/// A set of priority marks.
///
/// The set is small in practice (one entry per `mark` combinator traversed
/// by the winning match), so it is stored as a sorted vector rather than a
/// tree or hash set. Keeping it sorted makes equality and hashing of NFA
/// states cheap and deterministic.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct PmarkSet(Vec<Pmark>);

impl PmarkSet {
    /// Returns true if the given priority mark is in this set.
    #[inline]
    pub fn contains(&self, p: Pmark) -> bool {
        self.0.binary_search(&p).is_ok()
    }

    /// Returns an iterator over the marks in this set, in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = Pmark> + '_ {
        self.0.iter().copied()
    }

    /// Returns the number of marks in this set.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if this set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, p: Pmark) {
        if let Err(i) = self.0.binary_search(&p) {
            self.0.insert(i, p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pmark_set_is_sorted_and_deduped() {
        let (a, b, c) = (Pmark::fresh(), Pmark::fresh(), Pmark::fresh());
        let mut set = PmarkSet::default();
        set.insert(c);
        set.insert(a);
        set.insert(b);
        set.insert(a);
        assert_eq!(set.len(), 3);
        assert!(set.contains(a) && set.contains(b) && set.contains(c));
        let got: Vec<Pmark> = set.iter().collect();
        let mut sorted = got.clone();
        sorted.sort();
        assert_eq!(got, sorted);
    }

    #[test]
    fn fresh_pmarks_are_distinct() {
        assert_ne!(Pmark::fresh(), Pmark::fresh());
    }
}
