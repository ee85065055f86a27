/*!
The parameters of a search and the basic match types.

Every search entry point on [`Regex`](crate::Regex) is generic over
`Into<Input>`, so a `&str` or `&[u8]` can be passed directly to search the
whole haystack, while an explicit [`Input`] restricts the search to a
sub-span without losing the surrounding context for zero-width
assertions.
*/

use core::ops::Range;

/// A half-open range of offsets into a haystack.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Span {
    /// The start offset, inclusive.
    pub start: usize,
    /// The end offset, exclusive.
    pub end: usize,
}

impl Span {
    /// Returns this span as a `Range`.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns true when this span covers no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The number of bytes this span covers.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

impl core::fmt::Debug for Span {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Span {
        Span { start: range.start, end: range.end }
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Range<usize> {
        span.range()
    }
}

/// A successful match: the matched span together with the haystack it
/// points into.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Match<'h> {
    haystack: &'h [u8],
    span: Span,
}

impl<'h> Match<'h> {
    pub(crate) fn new(haystack: &'h [u8], span: Span) -> Match<'h> {
        Match { haystack, span }
    }

    /// The start offset of the match.
    #[inline]
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// The end offset of the match.
    #[inline]
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// The matched span.
    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Returns true when the match is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// The length of the match in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.span.len()
    }

    /// The matched bytes.
    #[inline]
    pub fn as_bytes(&self) -> &'h [u8] {
        &self.haystack[self.span.range()]
    }
}

impl<'h> core::fmt::Debug for Match<'h> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Match")
            .field("span", &self.span)
            .field("bytes", &crate::util::escape_bytes(self.as_bytes()))
            .finish()
    }
}

/// The parameters of a search: a haystack and the span to search within.
///
/// The span defaults to the whole haystack. Restricting it differs from
/// slicing the haystack: bytes outside the span stay visible to the
/// boundary categorization, so word boundaries and line anchors resolve
/// against the surrounding context.
#[derive(Clone)]
pub struct Input<'h> {
    haystack: &'h [u8],
    span: Span,
}

impl<'h> Input<'h> {
    /// Creates a search configuration covering the whole haystack.
    #[inline]
    pub fn new<H: ?Sized + AsRef<[u8]>>(haystack: &'h H) -> Input<'h> {
        let haystack = haystack.as_ref();
        Input { haystack, span: Span { start: 0, end: haystack.len() } }
    }

    /// Restricts the search to the given span.
    ///
    /// # Panics
    ///
    /// When the span does not fit within the haystack.
    #[inline]
    pub fn span<S: Into<Span>>(mut self, span: S) -> Input<'h> {
        let span = span.into();
        assert!(
            span.start <= span.end && span.end <= self.haystack.len(),
            "Input::span: {:?} is not a valid span for a haystack of \
             length {}",
            span,
            self.haystack.len(),
        );
        self.span = span;
        self
    }

    /// Restricts the search using anything that range syntax accepts,
    /// e.g. `input.range(2..)` or `input.range(..=5)`.
    ///
    /// # Panics
    ///
    /// When the range does not fit within the haystack.
    pub fn range<R: core::ops::RangeBounds<usize>>(
        self,
        range: R,
    ) -> Input<'h> {
        use core::ops::Bound;

        let start = match range.start_bound() {
            Bound::Included(&i) => i,
            Bound::Excluded(&i) => i.checked_add(1).unwrap(),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&i) => i.checked_add(1).unwrap(),
            Bound::Excluded(&i) => i,
            Bound::Unbounded => self.haystack.len(),
        };
        self.span(Span { start, end })
    }

    /// The haystack being searched.
    #[inline]
    pub fn haystack(&self) -> &'h [u8] {
        self.haystack
    }

    /// The start of the search span.
    #[inline]
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// The end of the search span.
    #[inline]
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// The search span.
    #[inline]
    pub fn get_span(&self) -> Span {
        self.span
    }
}

impl<'h> core::fmt::Debug for Input<'h> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Input")
            .field("haystack", &crate::util::escape_bytes(self.haystack))
            .field("span", &self.span)
            .finish()
    }
}

impl<'h, H: ?Sized + AsRef<[u8]>> From<&'h H> for Input<'h> {
    fn from(haystack: &'h H) -> Input<'h> {
        Input::new(haystack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_defaults_to_whole_haystack() {
        let input = Input::new("abc");
        assert_eq!(input.start(), 0);
        assert_eq!(input.end(), 3);
    }

    #[test]
    #[should_panic(expected = "Input::span")]
    fn input_rejects_out_of_bounds_span() {
        Input::new("abc").span(1..7);
    }

    #[test]
    #[should_panic(expected = "Input::span")]
    fn input_rejects_inverted_span() {
        Input::new("abc").span(Span { start: 2, end: 1 });
    }
}
