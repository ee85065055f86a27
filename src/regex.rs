/*!
The compiled regex and its search entry points.
*/

use std::cell::RefCell;
use std::sync::Arc;

use crate::ast::{self, Ast, MatchKind};
use crate::compile::{compile, Program};
use crate::dfa::{match_str, Cache, MatchResult};
use crate::util::captures::Captures;
use crate::util::iter::{
    CapturesIter, Matches, Split, SplitDelim, SplitFull,
};
use crate::util::search::{Input, Match};

/// A compiled regular expression.
///
/// A `Regex` is built once from an [`Ast`] by [`Regex::new`] and is then
/// immutable from the caller's point of view. Internally it carries a
/// lazily populated DFA: states and transitions are materialized the
/// first time a search needs them and are reused by every later search.
///
/// Because of that interior mutability, a `Regex` is `Send` but not
/// `Sync`. To search from several threads, either clone the regex per
/// thread (clones share nothing; a clone made after some searches carries
/// the already-built states with it) or wrap it in a mutex.
///
/// # Example
///
/// ```
/// use regex_comb::{byte, rep, seq, string, Regex};
///
/// let re = Regex::new(&seq(vec![string("a"), rep(byte(b'b')), string("c")]));
/// let m = re.find("abbbc").unwrap();
/// assert_eq!((m.start(), m.end()), (0, 5));
/// ```
#[derive(Clone)]
pub struct Regex {
    prog: Program,
    names: Arc<Vec<(String, usize)>>,
    cache: RefCell<Cache>,
}

impl Regex {
    /// Compiles a pattern.
    ///
    /// Compilation never fails: every `Ast` is a valid pattern. Patterns
    /// that are not anchored at the search start are compiled with an
    /// implicit non-greedy any-byte prefix, so searching scans the whole
    /// haystack in one pass.
    pub fn new(ast: &Ast) -> Regex {
        let prog = compile(ast);
        let names = Arc::new(prog.group_names.clone());
        Regex { prog, names, cache: RefCell::new(Cache::new()) }
    }

    /// Returns true when the pattern matches somewhere in the input.
    ///
    /// This records no capture positions and is the cheapest way to ask
    /// for existence.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_comb::{no_case, string, Regex};
    ///
    /// let re = Regex::new(&no_case(string("abc")));
    /// assert!(re.is_match("xxABCyy"));
    /// assert!(!re.is_match("xxAByy"));
    /// ```
    pub fn is_match<'h, I: Into<Input<'h>>>(&self, input: I) -> bool {
        let input = input.into();
        matches!(
            self.exec(&input, false, false),
            MatchResult::Match { .. }
        )
    }

    /// Finds the first match and returns its span.
    pub fn find<'h, I: Into<Input<'h>>>(&self, input: I) -> Option<Match<'h>> {
        self.captures(input).map(|caps| caps.get_match())
    }

    /// Finds the first match and returns its capture groups.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_comb::{digit, group, rep1, seq, string, Regex};
    ///
    /// let re = Regex::new(&seq(vec![string("x"), group(rep1(digit()))]));
    /// let caps = re.captures("abx42z").unwrap();
    /// assert_eq!(&caps[0], b"x42");
    /// assert_eq!(&caps[1], b"42");
    /// ```
    pub fn captures<'h, I: Into<Input<'h>>>(
        &self,
        input: I,
    ) -> Option<Captures<'h>> {
        let input = input.into();
        self.captures_within(input.haystack(), input.start(), input.end())
    }

    /// Matches a prefix of the input, reporting whether more input could
    /// still lead to a match.
    ///
    /// [`PartialMatch::Partial`] means the input ended while a match was
    /// still possible; [`PartialMatch::Mismatch`] means no amount of
    /// further input can produce one.
    pub fn partial_match<'h, I: Into<Input<'h>>>(
        &self,
        input: I,
    ) -> PartialMatch {
        let input = input.into();
        match self.exec(&input, false, true) {
            MatchResult::Match { .. } => PartialMatch::Full,
            MatchResult::Failed => PartialMatch::Mismatch,
            MatchResult::Running { .. } => PartialMatch::Partial,
        }
    }

    /// Like [`Regex::partial_match`], but resolves capture groups for a
    /// full match and reports where a future match could start for a
    /// partial one.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_comb::{string, PartialCaptures, Regex};
    ///
    /// let re = Regex::new(&string("abcdef"));
    /// match re.partial_captures("zabc") {
    ///     PartialCaptures::Partial(start) => assert_eq!(start, 1),
    ///     got => panic!("expected a partial match, got {:?}", got),
    /// }
    /// ```
    pub fn partial_captures<'h, I: Into<Input<'h>>>(
        &self,
        input: I,
    ) -> PartialCaptures<'h> {
        let input = input.into();
        match self.exec(&input, true, true) {
            MatchResult::Match { marks, gpos } => {
                PartialCaptures::Full(Captures::new(
                    input.haystack(),
                    marks,
                    gpos,
                    self.prog.group_count,
                    Arc::clone(&self.names),
                ))
            }
            MatchResult::Failed => PartialCaptures::Mismatch,
            MatchResult::Running { no_match_starts_before } => {
                PartialCaptures::Partial(no_match_starts_before)
            }
        }
    }

    /// Iterates over the capture groups of every non-overlapping match,
    /// left to right.
    pub fn captures_iter<'r, 'h, I: Into<Input<'h>>>(
        &'r self,
        input: I,
    ) -> CapturesIter<'r, 'h> {
        CapturesIter::new(self, input.into())
    }

    /// Iterates over every non-overlapping match, left to right.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_comb::{digit, rep1, Regex};
    ///
    /// let re = Regex::new(&rep1(digit()));
    /// let nums: Vec<&[u8]> =
    ///     re.find_iter("a12b345").map(|m| m.as_bytes()).collect();
    /// assert_eq!(nums, vec![&b"12"[..], &b"345"[..]]);
    /// ```
    pub fn find_iter<'r, 'h, I: Into<Input<'h>>>(
        &'r self,
        input: I,
    ) -> Matches<'r, 'h> {
        Matches::new(self, input.into())
    }

    /// Splits the input around matches, interleaving the text between
    /// matches with the matches themselves. Leading text is omitted when
    /// the first match starts at the search start; trailing text is
    /// emitted only when non-empty.
    pub fn split_full<'r, 'h, I: Into<Input<'h>>>(
        &'r self,
        input: I,
    ) -> SplitFull<'r, 'h> {
        SplitFull::new(self, input.into())
    }

    /// Splits the input around matches, yielding only the text between
    /// them.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_comb::{rep1, set, Regex};
    ///
    /// let re = Regex::new(&rep1(set(" \t")));
    /// let fields: Vec<&[u8]> = re.split("  a b\tc ").collect();
    /// assert_eq!(fields, vec![&b"a"[..], &b"b"[..], &b"c"[..]]);
    /// ```
    pub fn split<'r, 'h, I: Into<Input<'h>>>(
        &'r self,
        input: I,
    ) -> Split<'r, 'h> {
        Split::new(self, input.into())
    }

    /// Splits the input around matches so that texts and delimiters
    /// interleave strictly: a leading or trailing delimiter is padded
    /// with an empty text.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_comb::{rep1, set, Regex};
    ///
    /// let re = Regex::new(&rep1(set(" \t")));
    /// let fields: Vec<&[u8]> = re.split_delim("  a b\tc ").collect();
    /// assert_eq!(
    ///     fields,
    ///     vec![&b""[..], &b"a"[..], &b"b"[..], &b"c"[..], &b""[..]],
    /// );
    /// ```
    pub fn split_delim<'r, 'h, I: Into<Input<'h>>>(
        &'r self,
        input: I,
    ) -> SplitDelim<'r, 'h> {
        SplitDelim::new(self, input.into())
    }

    /// Replaces every match by the output of `f`, which appends its
    /// replacement to the buffer it is given. Text outside matches is
    /// copied verbatim.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_comb::{digit, group, rep1, Regex};
    ///
    /// let re = Regex::new(&group(rep1(digit())));
    /// let out = re.replace("x12y34z", |caps, dst: &mut Vec<u8>| {
    ///     dst.push(b'<');
    ///     dst.extend_from_slice(&caps[0]);
    ///     dst.push(b'>');
    /// });
    /// assert_eq!(out, b"x<12>y<34>z");
    /// ```
    pub fn replace<'h, I, F>(&self, input: I, f: F) -> Vec<u8>
    where
        I: Into<Input<'h>>,
        F: FnMut(&Captures<'h>, &mut Vec<u8>),
    {
        self.replace_impl(input.into(), true, f)
    }

    /// Like [`Regex::replace`], but stops after the first match.
    pub fn replace_first<'h, I, F>(&self, input: I, f: F) -> Vec<u8>
    where
        I: Into<Input<'h>>,
        F: FnMut(&Captures<'h>, &mut Vec<u8>),
    {
        self.replace_impl(input.into(), false, f)
    }

    /// Replaces every match by the given bytes.
    pub fn replace_bytes<'h, I: Into<Input<'h>>>(
        &self,
        input: I,
        by: &[u8],
    ) -> Vec<u8> {
        self.replace(input, |_, dst: &mut Vec<u8>| {
            dst.extend_from_slice(by)
        })
    }

    /// Replaces the first match by the given bytes.
    pub fn replace_first_bytes<'h, I: Into<Input<'h>>>(
        &self,
        input: I,
        by: &[u8],
    ) -> Vec<u8> {
        self.replace_first(input, |_, dst: &mut Vec<u8>| {
            dst.extend_from_slice(by)
        })
    }

    /// The number of capture groups, the implicit group 0 included.
    pub fn group_count(&self) -> usize {
        self.prog.group_count
    }

    /// The named groups of this pattern and their indices, in order of
    /// declaration.
    pub fn group_names(
        &self,
    ) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.names.iter().map(|(name, i)| (name.as_str(), *i))
    }

    fn replace_impl<'h, F>(
        &self,
        input: Input<'h>,
        all: bool,
        mut f: F,
    ) -> Vec<u8>
    where
        F: FnMut(&Captures<'h>, &mut Vec<u8>),
    {
        let haystack = input.haystack();
        let limit = input.end();
        let mut pos = input.start();
        let mut buf = Vec::with_capacity(limit - pos);
        while pos <= limit {
            let caps = match self.captures_within(haystack, pos, limit) {
                None => break,
                Some(caps) => caps,
            };
            let span = caps.get_match().span();
            buf.extend_from_slice(&haystack[pos..span.start]);
            f(&caps, &mut buf);
            if span.is_empty() {
                // An empty match replaces nothing: copy the byte it sits
                // in front of and move past it.
                if span.end < limit {
                    buf.push(haystack[span.end]);
                }
                pos = span.end + 1;
            } else {
                pos = span.end;
            }
            if !all {
                break;
            }
        }
        buf.extend_from_slice(&haystack[pos.min(limit)..limit]);
        buf
    }

    pub(crate) fn captures_within<'h>(
        &self,
        haystack: &'h [u8],
        start: usize,
        end: usize,
    ) -> Option<Captures<'h>> {
        let mut cache = self.cache.borrow_mut();
        match match_str(
            &self.prog,
            &mut cache,
            true,
            false,
            haystack,
            start,
            end,
        ) {
            MatchResult::Match { marks, gpos } => Some(Captures::new(
                haystack,
                marks,
                gpos,
                self.prog.group_count,
                Arc::clone(&self.names),
            )),
            _ => None,
        }
    }

    fn exec(
        &self,
        input: &Input<'_>,
        groups: bool,
        partial: bool,
    ) -> MatchResult {
        let mut cache = self.cache.borrow_mut();
        match_str(
            &self.prog,
            &mut cache,
            groups,
            partial,
            input.haystack(),
            input.start(),
            input.end(),
        )
    }
}

impl core::fmt::Debug for Regex {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Regex")
            .field("groups", &self.prog.group_count)
            .field("colors", &self.prog.ncolor)
            .field("dfa_states", &self.cache.borrow().state_count())
            .finish()
    }
}

/// The outcome of matching a prefix of the input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PartialMatch {
    /// A complete match was found in the given input.
    Full,
    /// The input ended while a match was still possible.
    Partial,
    /// No further input can produce a match.
    Mismatch,
}

/// The outcome of matching a prefix of the input, with capture groups.
#[derive(Clone, Debug)]
pub enum PartialCaptures<'h> {
    /// A complete match was found in the given input.
    Full(Captures<'h>),
    /// The input ended while a match was still possible; no match can
    /// start before the given offset.
    Partial(usize),
    /// No further input can produce a match.
    Mismatch,
}

/// Configures how a pattern is compiled.
///
/// Every option corresponds to wrapping the pattern in the matching
/// combinator; the builder exists so that callers holding an [`Ast`] they
/// did not construct themselves can still toggle the common knobs.
///
/// # Example
///
/// ```
/// use regex_comb::{string, Builder};
///
/// let re = Builder::new().case_insensitive(true).build(&string("abc"));
/// assert!(re.is_match("aBc"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Builder {
    case_insensitive: bool,
    match_kind: Option<MatchKind>,
    ungreedy: bool,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// When enabled, matching ignores case, following Latin-1 folding.
    pub fn case_insensitive(mut self, yes: bool) -> Builder {
        self.case_insensitive = yes;
        self
    }

    /// Overrides how ambiguous matches are resolved.
    pub fn match_kind(mut self, kind: MatchKind) -> Builder {
        self.match_kind = Some(kind);
        self
    }

    /// When enabled, repetitions match as little as possible.
    pub fn ungreedy(mut self, yes: bool) -> Builder {
        self.ungreedy = yes;
        self
    }

    /// Compiles the pattern with this configuration.
    pub fn build(&self, pattern: &Ast) -> Regex {
        let mut r = pattern.clone();
        if self.ungreedy {
            r = ast::non_greedy(r);
        }
        match self.match_kind {
            Some(MatchKind::Longest) => r = ast::longest(r),
            Some(MatchKind::Shortest) => r = ast::shortest(r),
            Some(MatchKind::First) => r = ast::first(r),
            None => {}
        }
        if self.case_insensitive {
            r = ast::no_case(r);
        }
        Regex::new(&r)
    }
}
