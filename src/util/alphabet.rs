/*!
Byte sets and the color map.

A [`CharSet`] is an ordered sequence of disjoint, non-adjacent, inclusive
byte ranges. All pattern-level character classes reduce to this
representation before compilation.

A [`ColorMap`] partitions the 256 byte values into equivalence classes
("colors") such that every character set occurring in a pattern is a union
of whole classes. The DFA then operates on colors instead of bytes, which
shrinks its transition tables considerably: a typical pattern needs a
handful of colors rather than 256.
*/

/// A set of bytes, stored as sorted, disjoint, non-adjacent inclusive
/// ranges.
///
/// The non-adjacency invariant (`hi + 1 < lo'` for consecutive ranges)
/// means equal sets always have equal representations, so derived equality
/// and hashing are structural.
#[derive(Clone, Default, Eq, Hash, PartialEq)]
pub(crate) struct CharSet {
    ranges: Vec<(u8, u8)>,
}

impl CharSet {
    /// The empty set.
    pub(crate) fn empty() -> CharSet {
        CharSet { ranges: vec![] }
    }

    /// The set of all 256 byte values.
    pub(crate) fn any() -> CharSet {
        CharSet { ranges: vec![(0x00, 0xFF)] }
    }

    /// The singleton set `{b}`.
    pub(crate) fn single(b: u8) -> CharSet {
        CharSet { ranges: vec![(b, b)] }
    }

    /// The inclusive range `[lo, hi]`, or the empty set when `lo > hi`.
    pub(crate) fn range(lo: u8, hi: u8) -> CharSet {
        if lo <= hi {
            CharSet { ranges: vec![(lo, hi)] }
        } else {
            CharSet::empty()
        }
    }

    /// Builds a set from arbitrary inclusive ranges, in any order.
    pub(crate) fn from_ranges<I>(it: I) -> CharSet
    where
        I: IntoIterator<Item = (u8, u8)>,
    {
        let mut set = CharSet::empty();
        for (lo, hi) in it {
            set = set.union(&CharSet::range(lo, hi));
        }
        set
    }

    /// Returns true if `b` is in this set.
    pub(crate) fn contains(&self, b: u8) -> bool {
        use core::cmp::Ordering;

        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if b < lo {
                    Ordering::Greater
                } else if b > hi {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }

    /// If this set contains exactly one byte, returns it.
    pub(crate) fn single_byte(&self) -> Option<u8> {
        match *self.ranges.as_slice() {
            [(lo, hi)] if lo == hi => Some(lo),
            _ => None,
        }
    }

    /// Returns some byte in this set (the smallest), if any.
    pub(crate) fn pick(&self) -> Option<u8> {
        self.ranges.first().map(|&(lo, _)| lo)
    }

    /// Iterates over the ranges of this set in increasing order.
    pub(crate) fn iter_ranges(
        &self,
    ) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.ranges.iter().copied()
    }

    /// The union of two sets. Adjacent ranges are coalesced so that the
    /// representation invariant is preserved.
    pub(crate) fn union(&self, other: &CharSet) -> CharSet {
        let (mut i, mut j) = (0, 0);
        let (a, b) = (&self.ranges, &other.ranges);
        let mut out = CharSet::empty();
        while i < a.len() || j < b.len() {
            let next = if j == b.len() || (i < a.len() && a[i].0 <= b[j].0) {
                i += 1;
                a[i - 1]
            } else {
                j += 1;
                b[j - 1]
            };
            out.push_coalesce(next);
        }
        out
    }

    /// The intersection of two sets.
    pub(crate) fn inter(&self, other: &CharSet) -> CharSet {
        let (mut i, mut j) = (0, 0);
        let (a, b) = (&self.ranges, &other.ranges);
        let mut out = CharSet::empty();
        while i < a.len() && j < b.len() {
            let (lo1, hi1) = a[i];
            let (lo2, hi2) = b[j];
            let lo = lo1.max(lo2);
            let hi = hi1.min(hi2);
            if lo <= hi {
                // Overlaps from distinct range pairs can never touch, so no
                // coalescing is needed here.
                out.ranges.push((lo, hi));
            }
            if hi1 <= hi2 {
                i += 1;
            } else {
                j += 1;
            }
        }
        out
    }

    /// The set difference `self - other`.
    pub(crate) fn diff(&self, other: &CharSet) -> CharSet {
        self.inter(&other.negate())
    }

    /// The complement of this set with respect to all 256 byte values.
    pub(crate) fn negate(&self) -> CharSet {
        let mut out = CharSet::empty();
        let mut next: i32 = 0;
        for &(lo, hi) in &self.ranges {
            if next < lo as i32 {
                out.ranges.push((next as u8, lo - 1));
            }
            next = hi as i32 + 1;
        }
        if next <= 0xFF {
            out.ranges.push((next as u8, 0xFF));
        }
        out
    }

    /// Shifts every byte in the set by `delta`, discarding anything that
    /// falls outside `0..=255`.
    pub(crate) fn offset(&self, delta: i32) -> CharSet {
        let mut out = CharSet::empty();
        for &(lo, hi) in &self.ranges {
            let lo = lo as i32 + delta;
            let hi = hi as i32 + delta;
            if hi < 0 || lo > 0xFF {
                continue;
            }
            out.push_coalesce((lo.max(0) as u8, hi.min(0xFF) as u8));
        }
        out
    }

    /// Extends this set with the case-swapped images of its Latin-1
    /// letters, so that matching becomes case insensitive.
    pub(crate) fn case_insens(&self) -> CharSet {
        // The foldable letters. These deliberately exclude the caseless
        // oddballs (0xB5, 0xDF, 0xFF) whose Latin-1 "fold" is not at
        // distance 32.
        let upper = CharSet::from_ranges([
            (b'A', b'Z'),
            (0xC0, 0xD6),
            (0xD8, 0xDE),
        ]);
        let lower = upper.offset(32);
        let folded = self
            .inter(&upper)
            .offset(32)
            .union(&self.inter(&lower).offset(-32));
        self.union(&folded)
    }

    fn push_coalesce(&mut self, (lo, hi): (u8, u8)) {
        match self.ranges.last_mut() {
            Some(last) if lo as i32 <= last.1 as i32 + 1 => {
                last.1 = last.1.max(hi);
            }
            _ => self.ranges.push((lo, hi)),
        }
    }
}

impl core::fmt::Debug for CharSet {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "CharSet(")?;
        for (i, &(lo, hi)) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if lo == hi {
                write!(f, "{:?}", DebugByte(lo))?;
            } else {
                write!(f, "{:?}-{:?}", DebugByte(lo), DebugByte(hi))?;
            }
        }
        write!(f, ")")
    }
}

/// Prints a byte as itself when printable ASCII and as an escape otherwise.
struct DebugByte(u8);

impl core::fmt::Debug for DebugByte {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if 0x20 <= self.0 && self.0 <= 0x7E {
            write!(f, "{}", self.0 as char)
        } else {
            write!(f, "\\x{:02X}", self.0)
        }
    }
}

/// An accumulator for the equivalence partition induced by a pattern.
///
/// Every character set occurring in the pattern is fed to [`split`], which
/// records the boundaries at which class membership can change. Freezing
/// the builder yields the final byte-to-color table.
///
/// [`split`]: ColorMapBuilder::split
#[derive(Clone, Debug)]
pub(crate) struct ColorMapBuilder {
    // ends[b] is true when byte b is the last member of its class.
    ends: [bool; 256],
}

impl ColorMapBuilder {
    /// Creates a builder where all bytes share a single class.
    pub(crate) fn new() -> ColorMapBuilder {
        ColorMapBuilder { ends: [false; 256] }
    }

    /// Refines the partition so that every class is entirely inside or
    /// entirely outside the given set.
    pub(crate) fn split(&mut self, set: &CharSet) {
        for (lo, hi) in set.iter_ranges() {
            if lo > 0 {
                self.ends[lo as usize - 1] = true;
            }
            self.ends[hi as usize] = true;
        }
    }

    /// Assigns the final colors. Classes are numbered from 0 in increasing
    /// byte order, and each class is represented by its smallest byte.
    pub(crate) fn freeze(&self) -> ColorMap {
        let mut colors = [0u8; 256];
        let mut repr = vec![0u8];
        let mut color = 0u8;
        for b in 0..=255u8 {
            colors[b as usize] = color;
            if self.ends[b as usize] && b < 255 {
                color = color.checked_add(1).unwrap();
                repr.push(b + 1);
            }
        }
        ColorMap { colors, repr }
    }
}

/// A frozen byte-to-color table together with one representative byte per
/// color.
#[derive(Clone)]
pub(crate) struct ColorMap {
    colors: [u8; 256],
    repr: Vec<u8>,
}

impl ColorMap {
    /// The color of the given byte.
    #[inline]
    pub(crate) fn color(&self, b: u8) -> u8 {
        self.colors[b as usize]
    }

    /// Some byte belonging to the given color (the smallest).
    #[inline]
    pub(crate) fn repr(&self, color: usize) -> u8 {
        self.repr[color]
    }

    /// The number of colors. At most 256.
    #[inline]
    pub(crate) fn ncolor(&self) -> usize {
        self.repr.len()
    }

    /// Maps a set of bytes to the corresponding set of colors.
    ///
    /// This is only meaningful for sets that were fed to the builder:
    /// colors increase monotonically with byte values, so each byte range
    /// maps to the color range of its endpoints.
    pub(crate) fn translate(&self, set: &CharSet) -> CharSet {
        let mut out = CharSet::empty();
        for (lo, hi) in set.iter_ranges() {
            let r = CharSet::range(self.color(lo), self.color(hi));
            out = out.union(&r);
        }
        out
    }
}

impl core::fmt::Debug for ColorMap {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("ColorMap")
            .field("ncolor", &self.ncolor())
            .field("repr", &self.repr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl quickcheck::Arbitrary for CharSet {
        fn arbitrary(gen: &mut quickcheck::Gen) -> CharSet {
            let ranges: Vec<(u8, u8)> = Vec::arbitrary(gen);
            CharSet::from_ranges(
                ranges.into_iter().map(|(a, b)| (a.min(b), a.max(b))),
            )
        }
    }

    fn members(set: &CharSet) -> Vec<u8> {
        (0..=255u8).filter(|&b| set.contains(b)).collect()
    }

    #[test]
    fn basic_algebra() {
        let azl = CharSet::range(b'a', b'z');
        let azu = CharSet::range(b'A', b'Z');
        let both = azl.union(&azu);
        assert!(both.contains(b'q') && both.contains(b'Q'));
        assert!(!both.contains(b'0'));
        assert_eq!(azl.inter(&azu), CharSet::empty());
        assert_eq!(both.diff(&azu), azl);
        assert_eq!(azl.offset(-32), azu);
        assert_eq!(CharSet::any().negate(), CharSet::empty());
    }

    #[test]
    fn union_coalesces_adjacent_ranges() {
        let s = CharSet::range(b'a', b'm').union(&CharSet::range(b'n', b'z'));
        assert_eq!(s, CharSet::range(b'a', b'z'));
        let s = CharSet::single(0xFE).union(&CharSet::single(0xFF));
        assert_eq!(s, CharSet::range(0xFE, 0xFF));
    }

    #[test]
    fn case_insens_folds_both_ways() {
        let s = CharSet::single(b'a').case_insens();
        assert!(s.contains(b'a') && s.contains(b'A'));
        let s = CharSet::single(b'Z').case_insens();
        assert!(s.contains(b'z') && s.contains(b'Z'));
        // 0xE9 is 'é'; its uppercase form is 0xC9.
        let s = CharSet::single(0xC9).case_insens();
        assert!(s.contains(0xE9));
        // The micro sign has no Latin-1 fold at distance 32.
        let s = CharSet::single(0xB5).case_insens();
        assert_eq!(members(&s), vec![0xB5]);
    }

    #[test]
    fn algebra_matches_membership() {
        fn prop(a: CharSet, b: CharSet, c: u8) -> bool {
            a.union(&b).contains(c) == (a.contains(c) || b.contains(c))
                && a.inter(&b).contains(c)
                    == (a.contains(c) && b.contains(c))
                && a.diff(&b).contains(c)
                    == (a.contains(c) && !b.contains(c))
                && a.negate().contains(c) == !a.contains(c)
        }
        quickcheck::quickcheck(prop as fn(CharSet, CharSet, u8) -> bool);
    }

    #[test]
    fn color_classes() {
        let mut builder = ColorMapBuilder::new();
        builder.split(&CharSet::range(b'a', b'z'));
        let map = builder.freeze();
        assert_eq!(map.ncolor(), 3);
        assert_eq!(map.color(0), 0);
        assert_eq!(map.color(b'a' - 1), 0);
        assert_eq!(map.color(b'a'), 1);
        assert_eq!(map.color(b'm'), 1);
        assert_eq!(map.color(b'z'), 1);
        assert_eq!(map.color(b'z' + 1), 2);
        assert_eq!(map.color(255), 2);
        assert_eq!(map.repr(1), b'a');

        let mut builder = ColorMapBuilder::new();
        builder.split(&CharSet::range(0, 2));
        builder.split(&CharSet::range(4, 6));
        let map = builder.freeze();
        assert_eq!(map.ncolor(), 4);
        assert_eq!(map.color(2), 0);
        assert_eq!(map.color(3), 1);
        assert_eq!(map.color(4), 2);
        assert_eq!(map.color(7), 3);
        assert_eq!(map.color(255), 3);
    }

    #[test]
    fn full_split_yields_256_colors() {
        let mut builder = ColorMapBuilder::new();
        for b in 0..=255u8 {
            builder.split(&CharSet::single(b));
        }
        let map = builder.freeze();
        assert_eq!(map.ncolor(), 256);
        assert_eq!(map.color(17), 17);
    }

    #[test]
    fn translate_preserves_membership() {
        let mut builder = ColorMapBuilder::new();
        let set = CharSet::range(b'b', b'd').union(&CharSet::single(b'z'));
        builder.split(&set);
        let map = builder.freeze();
        let colorset = map.translate(&set);
        for b in 0..=255u8 {
            assert_eq!(
                set.contains(b),
                colorset.contains(map.color(b)),
                "byte {:?}",
                b,
            );
        }
    }
}
