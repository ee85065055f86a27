/*!
The combinator syntax of regular expressions.

Patterns are built programmatically from the constructors in this module;
there is no textual syntax here. Surface parsers (POSIX, PCRE, ...) are
expected to live outside this crate and lower their syntax to an [`Ast`].

The constructors perform the only validation this crate ever does on
patterns: repetition bounds must be ordered, and the set operations
[`inter`], [`compl`] and [`diff`] only accept operands that reduce to a
character set. Everything else is accepted and compiles.
*/

use crate::util::alphabet::CharSet;
use crate::util::primitives::Pmark;

/// The resolution policy for ambiguous matches.
///
/// This governs how alternation and repetition decide between several ways
/// of matching at the same starting position. It is set on a sub-pattern
/// with [`first`], [`shortest`] or [`longest`], and the default is
/// `First`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MatchKind {
    /// Earlier alternatives win; repetition follows greediness.
    #[default]
    First,
    /// The shortest overall match wins.
    Shortest,
    /// The longest overall match wins.
    Longest,
}

/// A regular expression, built by the combinator constructors of this
/// crate and consumed by [`Regex::new`](crate::Regex::new).
///
/// `Ast` values are plain data: cheap to clone, comparable, and printable
/// for debugging. They carry no compiled state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ast {
    pub(crate) kind: AstKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum AstKind {
    Set(CharSet),
    Sequence(Vec<Ast>),
    Alternative(Vec<Ast>),
    Repeat(Box<Ast>, usize, Option<usize>),
    BegOfLine,
    EndOfLine,
    BegOfWord,
    EndOfWord,
    NotBound,
    BegOfStr,
    EndOfStr,
    LastEndOfLine,
    Start,
    Stop,
    Sem(MatchKind, Box<Ast>),
    SemGreedy(bool, Box<Ast>),
    Group(Option<String>, Box<Ast>),
    NoGroup(Box<Ast>),
    Nest(Box<Ast>),
    Case(Box<Ast>),
    NoCase(Box<Ast>),
    Intersection(Vec<Ast>),
    Complement(Vec<Ast>),
    Difference(Box<Ast>, Box<Ast>),
    Pmark(Pmark, Box<Ast>),
}

fn mk(kind: AstKind) -> Ast {
    Ast { kind }
}

/// Matches the single byte `b`.
pub fn byte(b: u8) -> Ast {
    mk(AstKind::Set(CharSet::single(b)))
}

/// Matches the given bytes literally. The empty string matches the empty
/// word.
pub fn string<S: AsRef<[u8]>>(s: S) -> Ast {
    seq(s.as_ref().iter().map(|&b| byte(b)).collect())
}

/// Matches any one of the given bytes.
pub fn set<S: AsRef<[u8]>>(s: S) -> Ast {
    mk(AstKind::Set(CharSet::from_ranges(
        s.as_ref().iter().map(|&b| (b, b)),
    )))
}

/// Matches any byte in the inclusive range `[lo, hi]`. An inverted range
/// matches nothing.
pub fn range(lo: u8, hi: u8) -> Ast {
    mk(AstKind::Set(CharSet::range(lo, hi)))
}

/// Ordered alternation. `alt(vec![])` matches nothing at all; singleton
/// lists are inlined.
pub fn alt(mut l: Vec<Ast>) -> Ast {
    if l.len() == 1 {
        l.pop().unwrap()
    } else {
        mk(AstKind::Alternative(l))
    }
}

/// Sequencing. `seq(vec![])` matches the empty word; singleton lists are
/// inlined.
pub fn seq(mut l: Vec<Ast>) -> Ast {
    if l.len() == 1 {
        l.pop().unwrap()
    } else {
        mk(AstKind::Sequence(l))
    }
}

/// A pattern matching nothing at all.
pub fn empty() -> Ast {
    alt(vec![])
}

/// A pattern matching the empty word.
pub fn epsilon() -> Ast {
    seq(vec![])
}

/// Matches `r` repeated between `i` and `j` times (inclusive), or
/// unboundedly when `j` is `None`.
///
/// # Panics
///
/// When `j` is `Some(v)` with `v < i`.
pub fn repn(r: Ast, i: usize, j: Option<usize>) -> Ast {
    if let Some(j) = j {
        assert!(i <= j, "repn requires i <= j (got i={}, j={})", i, j);
    }
    match (i, j) {
        (0, Some(0)) => epsilon(),
        (1, Some(1)) => r,
        _ => mk(AstKind::Repeat(Box::new(r), i, j)),
    }
}

/// Matches `r` zero or more times.
pub fn rep(r: Ast) -> Ast {
    repn(r, 0, None)
}

/// Matches `r` one or more times.
pub fn rep1(r: Ast) -> Ast {
    repn(r, 1, None)
}

/// Matches `r` zero or one time.
pub fn opt(r: Ast) -> Ast {
    repn(r, 0, Some(1))
}

/// Matches at the beginning of a line.
pub fn bol() -> Ast {
    mk(AstKind::BegOfLine)
}

/// Matches at the end of a line.
pub fn eol() -> Ast {
    mk(AstKind::EndOfLine)
}

/// Matches at the beginning of a word.
pub fn bow() -> Ast {
    mk(AstKind::BegOfWord)
}

/// Matches at the end of a word.
pub fn eow() -> Ast {
    mk(AstKind::EndOfWord)
}

/// Matches `r` as a whole word.
pub fn word(r: Ast) -> Ast {
    seq(vec![bow(), r, eow()])
}

/// Matches anywhere except at a word boundary.
pub fn not_boundary() -> Ast {
    mk(AstKind::NotBound)
}

/// Matches at the beginning of the input.
pub fn bos() -> Ast {
    mk(AstKind::BegOfStr)
}

/// Matches at the end of the input.
pub fn eos() -> Ast {
    mk(AstKind::EndOfStr)
}

/// Matches `r` against the whole input.
pub fn whole_string(r: Ast) -> Ast {
    seq(vec![bos(), r, eos()])
}

/// Matches at the last end of line before the end of the input: either
/// the end itself, or a final newline.
pub fn leol() -> Ast {
    mk(AstKind::LastEndOfLine)
}

/// Matches at the position where the search started.
pub fn start() -> Ast {
    mk(AstKind::Start)
}

/// Matches at the position where the search stops.
pub fn stop() -> Ast {
    mk(AstKind::Stop)
}

/// Resolves ambiguity in `r` in favor of the longest match.
pub fn longest(r: Ast) -> Ast {
    mk(AstKind::Sem(MatchKind::Longest, Box::new(r)))
}

/// Resolves ambiguity in `r` in favor of the shortest match.
pub fn shortest(r: Ast) -> Ast {
    mk(AstKind::Sem(MatchKind::Shortest, Box::new(r)))
}

/// Resolves ambiguity in `r` in favor of the first match, in combinator
/// order. This is the default.
pub fn first(r: Ast) -> Ast {
    mk(AstKind::Sem(MatchKind::First, Box::new(r)))
}

/// Makes repetitions in `r` greedy. This is the default.
pub fn greedy(r: Ast) -> Ast {
    mk(AstKind::SemGreedy(true, Box::new(r)))
}

/// Makes repetitions in `r` non-greedy.
pub fn non_greedy(r: Ast) -> Ast {
    mk(AstKind::SemGreedy(false, Box::new(r)))
}

/// Makes `r` a capturing group.
pub fn group(r: Ast) -> Ast {
    mk(AstKind::Group(None, Box::new(r)))
}

/// Makes `r` a named capturing group.
pub fn named_group<S: Into<String>>(name: S, r: Ast) -> Ast {
    mk(AstKind::Group(Some(name.into()), Box::new(r)))
}

/// Suppresses all capturing groups inside `r`. Group names declared
/// inside are dropped silently.
pub fn no_group(r: Ast) -> Ast {
    mk(AstKind::NoGroup(Box::new(r)))
}

/// Limits the scope of group captures inside `r` to one iteration of an
/// enclosing repetition: when `r` is re-entered, captures recorded by the
/// previous iteration are forgotten.
pub fn nest(r: Ast) -> Ast {
    mk(AstKind::Nest(Box::new(r)))
}

/// Attaches a fresh priority mark to `r`. After a successful match,
/// [`Captures::marked`](crate::Captures::marked) tells whether the match
/// went through `r`.
pub fn mark(r: Ast) -> (Pmark, Ast) {
    let p = Pmark::fresh();
    (p, mk(AstKind::Pmark(p, Box::new(r))))
}

/// Makes matching inside `r` case sensitive. This is the default.
pub fn case(r: Ast) -> Ast {
    mk(AstKind::Case(Box::new(r)))
}

/// Makes matching inside `r` case insensitive, following Latin-1 case
/// folding.
pub fn no_case(r: Ast) -> Ast {
    mk(AstKind::NoCase(Box::new(r)))
}

/// The intersection of the given character sets.
///
/// # Panics
///
/// When some operand does not reduce to a character set.
pub fn inter(l: Vec<Ast>) -> Ast {
    let r = mk(AstKind::Intersection(l));
    assert!(is_charset(&r), "inter expects charsets as arguments");
    r
}

/// The complement of the union of the given character sets.
///
/// # Panics
///
/// When some operand does not reduce to a character set.
pub fn compl(l: Vec<Ast>) -> Ast {
    let r = mk(AstKind::Complement(l));
    assert!(is_charset(&r), "compl expects charsets as arguments");
    r
}

/// The character set difference `a - b`.
///
/// # Panics
///
/// When either operand does not reduce to a character set.
pub fn diff(a: Ast, b: Ast) -> Ast {
    let r = mk(AstKind::Difference(Box::new(a), Box::new(b)));
    assert!(is_charset(&r), "diff expects charsets as arguments");
    r
}

/// Matches any byte.
pub fn any() -> Ast {
    mk(AstKind::Set(CharSet::any()))
}

/// Matches any byte except `\n`.
pub fn notnl() -> Ast {
    mk(AstKind::Set(CharSet::any().diff(&CharSet::single(b'\n'))))
}

fn class(ranges: &[(u8, u8)]) -> Ast {
    mk(AstKind::Set(CharSet::from_ranges(ranges.iter().copied())))
}

/// Lower case Latin-1 letters.
pub fn lower() -> Ast {
    class(&[(b'a', b'z'), (0xB5, 0xB5), (0xDF, 0xF6), (0xF8, 0xFF)])
}

/// Upper case Latin-1 letters.
pub fn upper() -> Ast {
    class(&[(b'A', b'Z'), (0xC0, 0xD6), (0xD8, 0xDE)])
}

/// Latin-1 letters.
pub fn alpha() -> Ast {
    alt(vec![lower(), upper(), class(&[(0xAA, 0xAA), (0xBA, 0xBA)])])
}

/// ASCII decimal digits.
pub fn digit() -> Ast {
    class(&[(b'0', b'9')])
}

/// Letters and digits.
pub fn alnum() -> Ast {
    alt(vec![alpha(), digit()])
}

/// Word bytes: letters, digits and underscore.
pub fn wordc() -> Ast {
    alt(vec![alnum(), byte(b'_')])
}

/// The ASCII range.
pub fn ascii() -> Ast {
    class(&[(0x00, 0x7F)])
}

/// Space and horizontal tab.
pub fn blank() -> Ast {
    set("\t ")
}

/// Control characters.
pub fn cntrl() -> Ast {
    class(&[(0x00, 0x1F), (0x7F, 0x9F)])
}

/// Visible characters.
pub fn graph() -> Ast {
    class(&[(0x21, 0x7E), (0xA0, 0xFF)])
}

/// Printable characters.
pub fn print() -> Ast {
    class(&[(0x20, 0x7E), (0xA0, 0xFF)])
}

/// Punctuation and symbols.
pub fn punct() -> Ast {
    class(&[
        (0x21, 0x2F),
        (0x3A, 0x40),
        (0x5B, 0x60),
        (0x7B, 0x7E),
        (0xA0, 0xA9),
        (0xAB, 0xB4),
        (0xB6, 0xB9),
        (0xBB, 0xBF),
        (0xD7, 0xD7),
        (0xF7, 0xF7),
    ])
}

/// Whitespace.
pub fn space() -> Ast {
    class(&[(b' ', b' '), (0x09, 0x0D)])
}

/// Hexadecimal digits.
pub fn xdigit() -> Ast {
    alt(vec![digit(), class(&[(b'a', b'f'), (b'A', b'F')])])
}

/// Returns true when the pattern reduces to a single character set.
pub(crate) fn is_charset(ast: &Ast) -> bool {
    match &ast.kind {
        AstKind::Set(_) => true,
        AstKind::Alternative(l)
        | AstKind::Intersection(l)
        | AstKind::Complement(l) => l.iter().all(is_charset),
        AstKind::Difference(a, b) => is_charset(a) && is_charset(b),
        AstKind::Sem(_, r)
        | AstKind::SemGreedy(_, r)
        | AstKind::NoGroup(r)
        | AstKind::Case(r)
        | AstKind::NoCase(r) => is_charset(r),
        _ => false,
    }
}

fn as_set(ast: &Ast) -> &CharSet {
    match &ast.kind {
        AstKind::Set(s) => s,
        _ => unreachable!("operand did not normalize to a charset"),
    }
}

/// Normalizes a pattern: distributes case sensitivity down to the
/// character sets, evaluates the set operations, and collapses
/// alternations of character sets into a single set. After this pass,
/// `Case`, `NoCase`, `Intersection`, `Complement` and `Difference` no
/// longer occur.
pub(crate) fn handle_case(ign_case: bool, ast: &Ast) -> Ast {
    match &ast.kind {
        AstKind::Set(s) => mk(AstKind::Set(if ign_case {
            s.case_insens()
        } else {
            s.clone()
        })),
        AstKind::Sequence(l) => mk(AstKind::Sequence(
            l.iter().map(|r| handle_case(ign_case, r)).collect(),
        )),
        AstKind::Alternative(l) => {
            let l: Vec<Ast> =
                l.iter().map(|r| handle_case(ign_case, r)).collect();
            if l.iter().all(is_charset) {
                mk(AstKind::Set(l.iter().fold(
                    CharSet::empty(),
                    |acc, r| acc.union(as_set(r)),
                )))
            } else {
                mk(AstKind::Alternative(l))
            }
        }
        AstKind::Repeat(r, i, j) => mk(AstKind::Repeat(
            Box::new(handle_case(ign_case, r)),
            *i,
            *j,
        )),
        AstKind::Sem(k, r) => {
            let r = handle_case(ign_case, r);
            if is_charset(&r) {
                r
            } else {
                mk(AstKind::Sem(*k, Box::new(r)))
            }
        }
        AstKind::SemGreedy(g, r) => {
            let r = handle_case(ign_case, r);
            if is_charset(&r) {
                r
            } else {
                mk(AstKind::SemGreedy(*g, Box::new(r)))
            }
        }
        AstKind::Group(n, r) => mk(AstKind::Group(
            n.clone(),
            Box::new(handle_case(ign_case, r)),
        )),
        AstKind::NoGroup(r) => {
            let r = handle_case(ign_case, r);
            if is_charset(&r) {
                r
            } else {
                mk(AstKind::NoGroup(Box::new(r)))
            }
        }
        AstKind::Nest(r) => {
            let r = handle_case(ign_case, r);
            if is_charset(&r) {
                r
            } else {
                mk(AstKind::Nest(Box::new(r)))
            }
        }
        AstKind::Case(r) => handle_case(false, r),
        AstKind::NoCase(r) => handle_case(true, r),
        AstKind::Intersection(l) => {
            let l: Vec<Ast> =
                l.iter().map(|r| handle_case(ign_case, r)).collect();
            mk(AstKind::Set(l.iter().fold(CharSet::any(), |acc, r| {
                acc.inter(as_set(r))
            })))
        }
        AstKind::Complement(l) => {
            let l: Vec<Ast> =
                l.iter().map(|r| handle_case(ign_case, r)).collect();
            let union = l
                .iter()
                .fold(CharSet::empty(), |acc, r| acc.union(as_set(r)));
            mk(AstKind::Set(union.negate()))
        }
        AstKind::Difference(a, b) => {
            let a = handle_case(ign_case, a);
            let b = handle_case(ign_case, b);
            mk(AstKind::Set(as_set(&a).diff(as_set(&b))))
        }
        AstKind::Pmark(p, r) => {
            mk(AstKind::Pmark(*p, Box::new(handle_case(ign_case, r))))
        }
        kind => mk(kind.clone()),
    }
}

/// Produces some byte string matched by the pattern: anchors witness to
/// nothing, alternations to their first branch, repetitions to their
/// minimum count.
///
/// # Panics
///
/// When the pattern matches nothing at all (for example [`empty`]).
pub fn witness(ast: &Ast) -> Vec<u8> {
    fn go(ast: &Ast, out: &mut Vec<u8>) {
        match &ast.kind {
            AstKind::Set(s) => out.push(
                s.pick().expect("witness of a pattern matching nothing"),
            ),
            AstKind::Sequence(l) => {
                for r in l {
                    go(r, out);
                }
            }
            AstKind::Alternative(l) => {
                let r = l
                    .first()
                    .expect("witness of a pattern matching nothing");
                go(r, out);
            }
            AstKind::Repeat(r, i, _) => {
                for _ in 0..*i {
                    go(r, out);
                }
            }
            AstKind::Sem(_, r)
            | AstKind::SemGreedy(_, r)
            | AstKind::Group(_, r)
            | AstKind::NoGroup(r)
            | AstKind::Nest(r)
            | AstKind::Pmark(_, r) => go(r, out),
            AstKind::BegOfLine
            | AstKind::EndOfLine
            | AstKind::BegOfWord
            | AstKind::EndOfWord
            | AstKind::NotBound
            | AstKind::BegOfStr
            | AstKind::EndOfStr
            | AstKind::LastEndOfLine
            | AstKind::Start
            | AstKind::Stop => {}
            AstKind::Case(_)
            | AstKind::NoCase(_)
            | AstKind::Intersection(_)
            | AstKind::Complement(_)
            | AstKind::Difference(..) => {
                unreachable!("removed by normalization")
            }
        }
    }
    let mut out = Vec::new();
    go(&handle_case(false, ast), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repn_simplifies_trivial_bounds() {
        assert_eq!(repn(byte(b'a'), 0, Some(0)), epsilon());
        assert_eq!(repn(byte(b'a'), 1, Some(1)), byte(b'a'));
    }

    #[test]
    #[should_panic(expected = "repn requires i <= j")]
    fn repn_rejects_inverted_bounds() {
        repn(byte(b'a'), 3, Some(2));
    }

    #[test]
    #[should_panic(expected = "inter expects charsets")]
    fn inter_rejects_non_charsets() {
        inter(vec![digit(), string("ab")]);
    }

    #[test]
    fn set_operations_accept_charset_trees() {
        // Alternations of charsets and nested set operations are fine.
        let r = diff(alt(vec![lower(), upper()]), compl(vec![ascii()]));
        assert!(is_charset(&r));
    }

    #[test]
    fn normalization_folds_charset_alternatives() {
        let folded = handle_case(false, &alt(vec![digit(), lower()]));
        assert!(matches!(folded.kind, AstKind::Set(_)));

        let kept = handle_case(false, &alt(vec![digit(), string("ab")]));
        assert!(matches!(kept.kind, AstKind::Alternative(_)));
    }

    #[test]
    fn normalization_evaluates_set_operations() {
        let r = handle_case(false, &compl(vec![digit()]));
        match &r.kind {
            AstKind::Set(s) => {
                assert!(!s.contains(b'5'));
                assert!(s.contains(b'x'));
            }
            kind => panic!("expected a set, got {:?}", kind),
        }
    }

    #[test]
    fn case_folding_reaches_sets() {
        let r = handle_case(false, &no_case(string("ab")));
        match &r.kind {
            AstKind::Sequence(l) => match &l[0].kind {
                AstKind::Set(s) => {
                    assert!(s.contains(b'a') && s.contains(b'A'));
                }
                kind => panic!("expected a set, got {:?}", kind),
            },
            kind => panic!("expected a sequence, got {:?}", kind),
        }
    }

    #[test]
    fn witness_produces_a_minimal_member() {
        assert_eq!(witness(&string("abc")), b"abc");
        assert_eq!(witness(&alt(vec![string("xy"), string("z")])), b"xy");
        assert_eq!(witness(&repn(byte(b'a'), 3, None)), b"aaa");
        assert_eq!(witness(&seq(vec![bol(), opt(byte(b'q')), eos()])), b"");
    }

    #[test]
    #[should_panic(expected = "matching nothing")]
    fn witness_of_empty_panics() {
        witness(&empty());
    }
}
