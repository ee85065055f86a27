/*!
A regular expression engine for combinator-built patterns.

This crate compiles a structured regex — assembled from constructors like
[`string`], [`alt`] or [`rep`], never parsed from text — into a lazily
determinized DFA and runs it over byte haystacks. Submatch boundaries are
tracked with capture marks inside the automaton itself, so a single
left-to-right pass resolves group offsets, even for the non-greedy and
longest-match policies.

The engine is byte oriented: the built-in classes ([`alpha`], [`space`],
...) know about Latin-1, and haystacks are plain `&[u8]` (a `&str` works
anywhere a haystack is expected). There is no Unicode codepoint machinery,
no backreferences and no lookaround beyond the zero-width anchors.

Surface syntaxes (POSIX, PCRE, ...) are out of scope by design: a parser
for one of them is a caller of this crate that lowers its syntax into an
[`Ast`].

# Example

```
use regex_comb::{digit, group, rep1, Regex};

let re = Regex::new(&group(rep1(digit())));

let m = re.find("order 6021, shelf 9").unwrap();
assert_eq!((m.start(), m.end()), (6, 10));

let out = re.replace("x12y34z", |caps, dst: &mut Vec<u8>| {
    dst.push(b'<');
    dst.extend_from_slice(&caps[0]);
    dst.push(b'>');
});
assert_eq!(out, b"x<12>y<34>z");
```

# Lazy determinization and threads

Compilation ([`Regex::new`]) is pure and cheap; the DFA states and their
transition tables are only materialized as searches touch them, and stay
cached inside the `Regex` for its lifetime. The cache makes a `Regex`
`Send` but not `Sync`; clone it per thread (clones carry the states built
so far) or guard it with a mutex to share one across threads.
*/

#![deny(unsafe_code)]

#[macro_use]
mod macros;

mod ast;
mod compile;
mod dfa;
mod nfa;
mod regex;
mod util;

pub use crate::{
    ast::{
        alnum, alpha, alt, any, ascii, blank, bol, bos, bow, byte, case,
        cntrl, compl, diff, digit, empty, eol, eos, eow, epsilon, first,
        graph, greedy, group, inter, leol, longest, lower, mark,
        named_group, nest, no_case, no_group, non_greedy, not_boundary,
        notnl, opt, print, punct, range, rep, rep1, repn, seq, set,
        shortest, space, start, stop, string, upper, whole_string,
        witness, word, wordc, xdigit, Ast, MatchKind,
    },
    regex::{Builder, PartialCaptures, PartialMatch, Regex},
    util::{
        captures::Captures,
        iter::{Chunk, CapturesIter, Matches, Split, SplitDelim, SplitFull},
        primitives::{Pmark, PmarkSet},
        search::{Input, Match, Span},
    },
};
