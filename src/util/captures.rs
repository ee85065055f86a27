/*!
The result of a successful match: capture group offsets, group names and
priority marks.
*/

use std::sync::Arc;

use crate::nfa::Marks;
use crate::util::primitives::{Pmark, PmarkSet};
use crate::util::search::{Match, Span};

/// The capture groups of one successful match.
///
/// Group 0 always covers the whole match. Further groups correspond to
/// [`group`](crate::group)/[`named_group`](crate::named_group) combinators
/// in the order their opening side occurs in the pattern, and may be
/// unmatched when the winning path did not go through them.
///
/// Offsets are resolved lazily from the mark slots recorded during the
/// match: a `Captures` holds the position array of its match and an index
/// from marks into it.
#[derive(Clone)]
pub struct Captures<'h> {
    haystack: &'h [u8],
    /// Mark id -> slot in `gpos`, -1 when the mark was never crossed.
    slots: Vec<i32>,
    pmarks: PmarkSet,
    /// Position values, biased by +1 so that 0 means "never written".
    gpos: Vec<usize>,
    group_count: usize,
    names: Arc<Vec<(String, usize)>>,
}

impl<'h> Captures<'h> {
    pub(crate) fn new(
        haystack: &'h [u8],
        marks: Marks,
        gpos: Vec<usize>,
        group_count: usize,
        names: Arc<Vec<(String, usize)>>,
    ) -> Captures<'h> {
        let mut slots = vec![-1i32; 2 * group_count];
        for (mark, slot) in marks.marks {
            let mark = mark.as_usize();
            if mark < slots.len() {
                slots[mark] = slot;
            }
        }
        Captures {
            haystack,
            slots,
            pmarks: marks.pmarks,
            gpos,
            group_count,
            names,
        }
    }

    /// The haystack this match was found in.
    #[inline]
    pub fn haystack(&self) -> &'h [u8] {
        self.haystack
    }

    /// The whole match, equivalent to group 0.
    pub fn get_match(&self) -> Match<'h> {
        Match::new(
            self.haystack,
            self.offset(0).expect("group 0 of a successful match"),
        )
    }

    /// The span of group `i`, or `None` when the group did not
    /// participate in the match (or does not exist).
    pub fn offset(&self, i: usize) -> Option<Span> {
        let m1 = *self.slots.get(2 * i)?;
        let m2 = *self.slots.get(2 * i + 1)?;
        if m1 < 0 || m2 < 0 {
            return None;
        }
        let start = self.gpos[m1 as usize] - 1;
        let end = self.gpos[m2 as usize] - 1;
        Some(Span { start, end })
    }

    /// The bytes matched by group `i`, or `None` when unmatched.
    pub fn get(&self, i: usize) -> Option<&'h [u8]> {
        self.offset(i).map(|sp| &self.haystack[sp.range()])
    }

    /// The start offset of group `i`.
    pub fn start(&self, i: usize) -> Option<usize> {
        self.offset(i).map(|sp| sp.start)
    }

    /// The end offset of group `i`.
    pub fn stop(&self, i: usize) -> Option<usize> {
        self.offset(i).map(|sp| sp.end)
    }

    /// Returns true when group `i` participated in the match.
    pub fn matched(&self, i: usize) -> bool {
        self.offset(i).is_some()
    }

    /// The number of groups in the pattern, group 0 included. This is
    /// the same for every match of one regex, matched or not.
    #[inline]
    pub fn group_len(&self) -> usize {
        self.group_count
    }

    /// Iterates over all group spans, in group order. Unmatched groups
    /// yield `None`.
    pub fn iter(&self) -> impl Iterator<Item = Option<Span>> + '_ {
        (0..self.group_count).map(|i| self.offset(i))
    }

    /// The bytes matched by the group with the given name.
    pub fn name(&self, name: &str) -> Option<&'h [u8]> {
        let &(_, i) =
            self.names.iter().find(|(n, _)| n == name)?;
        self.get(i)
    }

    /// Returns true when the match went through the sub-pattern tagged
    /// with the given priority mark.
    pub fn marked(&self, p: Pmark) -> bool {
        self.pmarks.contains(p)
    }

    /// The set of priority marks the match went through.
    #[inline]
    pub fn pmarks(&self) -> &PmarkSet {
        &self.pmarks
    }
}

/// Indexes the bytes of a matched group.
///
/// # Panics
///
/// When the group does not exist or did not participate in the match.
/// Use [`Captures::get`] for a non-panicking accessor.
impl<'h> core::ops::Index<usize> for Captures<'h> {
    type Output = [u8];

    fn index(&self, i: usize) -> &[u8] {
        self.get(i)
            .unwrap_or_else(|| panic!("no group {} in this match", i))
    }
}

impl<'h> core::fmt::Debug for Captures<'h> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut dbg = f.debug_map();
        for (i, span) in self.iter().enumerate() {
            match span {
                None => dbg.entry(&i, &"<unmatched>"),
                Some(sp) => dbg.entry(
                    &i,
                    &format_args!(
                        "{:?} @ {:?}",
                        crate::util::escape_bytes(
                            &self.haystack[sp.range()]
                        ),
                        sp,
                    ),
                ),
            };
        }
        dbg.finish()
    }
}
