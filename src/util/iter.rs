/*!
Iterators over successive non-overlapping matches.

All iterators here are pull-based: each step runs one match to completion
and nothing happens between pulls. The tricky part is empty matches. After
a non-empty match the next search starts where it ended; after an empty
match the next search starts one byte further, and an empty match at the
exact position where the previous match ended is suppressed, else
iteration would report a bogus empty match after every real one (or loop
forever on an empty one).
*/

use crate::regex::Regex;
use crate::util::captures::Captures;
use crate::util::search::{Input, Match, Span};

/// An iterator over the capture groups of every non-overlapping match.
///
/// Created by [`Regex::captures_iter`].
#[derive(Debug)]
pub struct CapturesIter<'r, 'h> {
    re: &'r Regex,
    haystack: &'h [u8],
    end: usize,
    at: usize,
    last_match: Option<usize>,
}

impl<'r, 'h> CapturesIter<'r, 'h> {
    pub(crate) fn new(
        re: &'r Regex,
        input: Input<'h>,
    ) -> CapturesIter<'r, 'h> {
        CapturesIter {
            re,
            haystack: input.haystack(),
            end: input.end(),
            at: input.start(),
            last_match: None,
        }
    }

    #[cold]
    #[inline(never)]
    fn handle_empty(
        &mut self,
        m: Captures<'h>,
        span: Span,
    ) -> Option<Captures<'h>> {
        self.at = span.end + 1;
        if Some(span.end) == self.last_match {
            // An empty match exactly where the previous match ended:
            // skip it and take whatever comes next.
            if self.at > self.end {
                return None;
            }
            let m =
                self.re.captures_within(self.haystack, self.at, self.end)?;
            let span = m.get_match().span();
            self.at = if span.is_empty() {
                span.end + 1
            } else {
                span.end
            };
            return Some(m);
        }
        Some(m)
    }
}

impl<'r, 'h> Iterator for CapturesIter<'r, 'h> {
    type Item = Captures<'h>;

    fn next(&mut self) -> Option<Captures<'h>> {
        if self.at > self.end {
            return None;
        }
        let m = self.re.captures_within(self.haystack, self.at, self.end)?;
        let span = m.get_match().span();
        let m = if span.is_empty() {
            self.handle_empty(m, span)?
        } else {
            self.at = span.end;
            m
        };
        self.last_match = Some(m.get_match().end());
        Some(m)
    }
}

/// An iterator over every non-overlapping match, as [`Match`] values.
///
/// Created by [`Regex::find_iter`].
#[derive(Debug)]
pub struct Matches<'r, 'h>(CapturesIter<'r, 'h>);

impl<'r, 'h> Matches<'r, 'h> {
    pub(crate) fn new(re: &'r Regex, input: Input<'h>) -> Matches<'r, 'h> {
        Matches(CapturesIter::new(re, input))
    }
}

impl<'r, 'h> Iterator for Matches<'r, 'h> {
    type Item = Match<'h>;

    fn next(&mut self) -> Option<Match<'h>> {
        self.0.next().map(|caps| caps.get_match())
    }
}

/// One piece of a [`Regex::split_full`] decomposition: either a stretch
/// of text between matches, or the capture groups of a match.
#[derive(Debug)]
pub enum Chunk<'h> {
    Text(&'h [u8]),
    Delim(Captures<'h>),
}

/// An iterator interleaving the text between matches with the matches
/// themselves.
///
/// Created by [`Regex::split_full`].
#[derive(Debug)]
pub struct SplitFull<'r, 'h> {
    it: CapturesIter<'r, 'h>,
    haystack: &'h [u8],
    end: usize,
    last: usize,
    pending: Option<Captures<'h>>,
    done: bool,
}

impl<'r, 'h> SplitFull<'r, 'h> {
    pub(crate) fn new(
        re: &'r Regex,
        input: Input<'h>,
    ) -> SplitFull<'r, 'h> {
        SplitFull {
            haystack: input.haystack(),
            end: input.end(),
            last: input.start(),
            it: CapturesIter::new(re, input),
            pending: None,
            done: false,
        }
    }
}

impl<'r, 'h> Iterator for SplitFull<'r, 'h> {
    type Item = Chunk<'h>;

    fn next(&mut self) -> Option<Chunk<'h>> {
        if let Some(delim) = self.pending.take() {
            return Some(Chunk::Delim(delim));
        }
        if self.done {
            return None;
        }
        match self.it.next() {
            Some(caps) => {
                let span = caps.get_match().span();
                if span.start > self.last {
                    let text = &self.haystack[self.last..span.start];
                    self.last = span.end;
                    self.pending = Some(caps);
                    Some(Chunk::Text(text))
                } else {
                    self.last = span.end;
                    Some(Chunk::Delim(caps))
                }
            }
            None => {
                self.done = true;
                if self.last < self.end {
                    Some(Chunk::Text(&self.haystack[self.last..self.end]))
                } else {
                    None
                }
            }
        }
    }
}

/// An iterator over the text between matches.
///
/// Created by [`Regex::split`].
#[derive(Debug)]
pub struct Split<'r, 'h>(SplitFull<'r, 'h>);

impl<'r, 'h> Split<'r, 'h> {
    pub(crate) fn new(re: &'r Regex, input: Input<'h>) -> Split<'r, 'h> {
        Split(SplitFull::new(re, input))
    }
}

impl<'r, 'h> Iterator for Split<'r, 'h> {
    type Item = &'h [u8];

    fn next(&mut self) -> Option<&'h [u8]> {
        loop {
            match self.0.next()? {
                Chunk::Text(text) => return Some(text),
                Chunk::Delim(_) => continue,
            }
        }
    }
}

/// An iterator over the text around delimiters, strictly interleaved: a
/// leading delimiter is preceded by an empty text, a trailing one is
/// followed by an empty text, so texts always number one more than
/// delimiters.
///
/// Created by [`Regex::split_delim`].
#[derive(Debug)]
pub struct SplitDelim<'r, 'h> {
    it: CapturesIter<'r, 'h>,
    haystack: &'h [u8],
    end: usize,
    last: usize,
    done: bool,
}

impl<'r, 'h> SplitDelim<'r, 'h> {
    pub(crate) fn new(
        re: &'r Regex,
        input: Input<'h>,
    ) -> SplitDelim<'r, 'h> {
        SplitDelim {
            haystack: input.haystack(),
            end: input.end(),
            last: input.start(),
            it: CapturesIter::new(re, input),
            done: false,
        }
    }
}

impl<'r, 'h> Iterator for SplitDelim<'r, 'h> {
    type Item = &'h [u8];

    fn next(&mut self) -> Option<&'h [u8]> {
        if self.done {
            return None;
        }
        match self.it.next() {
            Some(caps) => {
                let span = caps.get_match().span();
                let text = &self.haystack[self.last..span.start];
                self.last = span.end;
                Some(text)
            }
            None => {
                self.done = true;
                Some(&self.haystack[self.last..self.end])
            }
        }
    }
}
