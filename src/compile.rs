/*!
Compilation of a pattern into an executable program.

Compilation runs in three passes over the (normalized) AST:

1. a coloring pass feeds every character set and every
   alphabet-discriminating anchor to the [`ColorMapBuilder`], producing the
   byte-to-color table;
2. the translation pass lowers the AST to NFA nodes, expressed in colors,
   allocating capture marks for groups along the way;
3. the `anchored` analysis decides whether the pattern needs the implicit
   non-greedy `any*` prefix that turns an anchored automaton into a
   searching one.

All three are pure; the result is a [`Program`] that the DFA driver
executes without ever looking at the AST again.
*/

use std::collections::HashMap;

use crate::ast::{self, handle_case, Ast, AstKind, MatchKind};
use crate::nfa::{Exprs, EPS};
use crate::util::alphabet::{CharSet, ColorMap, ColorMapBuilder};
use crate::util::look::Category;
use crate::util::primitives::{ExprId, Mark};

/// A compiled pattern: the NFA, the color tables and the capture group
/// layout. This is everything [`Regex`](crate::Regex) needs at match
/// time.
#[derive(Clone, Debug)]
pub(crate) struct Program {
    pub(crate) exprs: Exprs,
    pub(crate) init: ExprId,
    pub(crate) cmap: ColorMap,
    /// The synthetic color for a newline that ends the input, when the
    /// pattern distinguishes it.
    pub(crate) lnl: Option<usize>,
    /// Total number of colors, the synthetic one included.
    pub(crate) ncolor: usize,
    pub(crate) group_names: Vec<(String, usize)>,
    pub(crate) group_count: usize,
}

/// Compiles a pattern. Unanchored patterns are wrapped in a non-greedy
/// unanchored prefix, and the whole pattern becomes capture group 0.
pub(crate) fn compile(ast: &Ast) -> Program {
    let wrapped = if anchored(ast) {
        ast::group(ast.clone())
    } else {
        ast::seq(vec![
            ast::shortest(ast::rep(ast::any())),
            ast::group(ast.clone()),
        ])
    };
    let normalized = handle_case(false, &wrapped);

    let mut builder = ColorMapBuilder::new();
    let need_lnl = colorize(&mut builder, &normalized);
    let cmap = builder.freeze();
    let (lnl, ncolor) = if need_lnl {
        (Some(cmap.ncolor()), cmap.ncolor() + 1)
    } else {
        (None, cmap.ncolor())
    };

    let mut tr = Translator {
        exprs: Exprs::new(),
        cmap: &cmap,
        pos: 0,
        names: Vec::new(),
        cache: HashMap::new(),
    };
    let (r, kind) = tr.translate(MatchKind::First, false, true, &normalized);
    let init = tr.enforce_kind(MatchKind::First, kind, r);
    debug!(
        "compiled pattern: {} NFA nodes, {} colors (last-newline: {}), \
         {} capture groups",
        tr.exprs.len(),
        ncolor,
        need_lnl,
        tr.pos / 2,
    );

    let Translator { exprs, names, pos, .. } = tr;
    Program {
        exprs,
        init,
        cmap,
        lnl,
        ncolor,
        group_names: names,
        group_count: pos / 2,
    }
}

/// Returns true when every match of the pattern must begin exactly at the
/// search start position.
fn anchored(ast: &Ast) -> bool {
    match &ast.kind {
        AstKind::Sequence(l) => l.iter().any(anchored),
        AstKind::Alternative(l) => l.iter().all(anchored),
        AstKind::Repeat(r, i, _) => *i > 0 && anchored(r),
        AstKind::BegOfStr | AstKind::Start => true,
        AstKind::Sem(_, r)
        | AstKind::SemGreedy(_, r)
        | AstKind::Group(_, r)
        | AstKind::NoGroup(r)
        | AstKind::Nest(r)
        | AstKind::Case(r)
        | AstKind::NoCase(r)
        | AstKind::Pmark(_, r) => anchored(r),
        _ => false,
    }
}

/// The set of word bytes, as split by word boundary anchors. This must
/// agree with `util::look::is_word_byte`.
fn cword() -> CharSet {
    CharSet::from_ranges([
        (b'0', b'9'),
        (b'A', b'Z'),
        (b'_', b'_'),
        (b'a', b'z'),
        (0xAA, 0xAA),
        (0xB5, 0xB5),
        (0xBA, 0xBA),
        (0xC0, 0xD6),
        (0xD8, 0xF6),
        (0xF8, 0xFF),
    ])
}

/// Feeds every alphabet-discriminating construct of the normalized
/// pattern to the color map builder. Returns true when the pattern needs
/// the synthetic last-newline color.
fn colorize(builder: &mut ColorMapBuilder, ast: &Ast) -> bool {
    let mut need_lnl = false;
    fn go(builder: &mut ColorMapBuilder, need_lnl: &mut bool, ast: &Ast) {
        match &ast.kind {
            AstKind::Set(s) => builder.split(s),
            AstKind::Sequence(l) | AstKind::Alternative(l) => {
                for r in l {
                    go(builder, need_lnl, r);
                }
            }
            AstKind::Repeat(r, _, _) => go(builder, need_lnl, r),
            AstKind::BegOfLine | AstKind::EndOfLine => {
                builder.split(&CharSet::single(b'\n'));
            }
            AstKind::BegOfWord | AstKind::EndOfWord | AstKind::NotBound => {
                builder.split(&cword());
            }
            AstKind::BegOfStr
            | AstKind::EndOfStr
            | AstKind::Start
            | AstKind::Stop => {}
            AstKind::LastEndOfLine => *need_lnl = true,
            AstKind::Sem(_, r)
            | AstKind::SemGreedy(_, r)
            | AstKind::Group(_, r)
            | AstKind::NoGroup(r)
            | AstKind::Nest(r)
            | AstKind::Pmark(_, r) => go(builder, need_lnl, r),
            AstKind::Case(_)
            | AstKind::NoCase(_)
            | AstKind::Intersection(_)
            | AstKind::Complement(_)
            | AstKind::Difference(..) => {
                unreachable!("removed by normalization")
            }
        }
    }
    go(builder, &mut need_lnl, ast);
    need_lnl
}

/// Factors common heads out of adjacent sequences so that alternations
/// like `abc|abd` share their prefix in the NFA. Nested alternatives are
/// flattened first; the factored tails recursively merge again when the
/// resulting alternative is translated.
fn merge_sequences(l: &[Ast]) -> Vec<Ast> {
    let Some((head, rest)) = l.split_first() else {
        return Vec::new();
    };
    match &head.kind {
        AstKind::Alternative(l2) => {
            let mut combined = l2.clone();
            combined.extend_from_slice(rest);
            merge_sequences(&combined)
        }
        AstKind::Sequence(xs) if !xs.is_empty() => {
            let (x, y) = xs.split_first().unwrap();
            let mut merged = merge_sequences(rest);
            let mergeable = match merged.first() {
                Some(Ast { kind: AstKind::Sequence(xs2) }) => {
                    xs2.first() == Some(x)
                }
                _ => false,
            };
            if mergeable {
                let AstKind::Sequence(xs2) = merged.remove(0).kind else {
                    unreachable!()
                };
                let y2 = &xs2[1..];
                let node = ast::seq(vec![
                    x.clone(),
                    ast::alt(vec![
                        ast::seq(y.to_vec()),
                        ast::seq(y2.to_vec()),
                    ]),
                ]);
                merged.insert(0, node);
            } else {
                merged.insert(0, head.clone());
            }
            merged
        }
        _ => {
            let mut merged = merge_sequences(rest);
            merged.insert(0, head.clone());
            merged
        }
    }
}

struct Translator<'a> {
    exprs: Exprs,
    cmap: &'a ColorMap,
    /// Next free capture mark.
    pos: usize,
    names: Vec<(String, usize)>,
    /// Memoizes the byte-set to color-set translation; patterns tend to
    /// reuse the same classes many times.
    cache: HashMap<CharSet, CharSet>,
}

impl<'a> Translator<'a> {
    fn translate(
        &mut self,
        kind: MatchKind,
        ign_group: bool,
        greedy: bool,
        ast: &Ast,
    ) -> (ExprId, MatchKind) {
        match &ast.kind {
            AstKind::Set(s) => {
                let colors = self.trans_set(s);
                (self.exprs.cst(colors), kind)
            }
            AstKind::Sequence(l) => {
                (self.trans_seq(kind, ign_group, greedy, l), kind)
            }
            AstKind::Alternative(l) => {
                let merged = merge_sequences(l);
                if merged.len() == 1 {
                    let (cr, k) =
                        self.translate(kind, ign_group, greedy, &merged[0]);
                    (self.enforce_kind(kind, k, cr), kind)
                } else {
                    let mut branches = Vec::with_capacity(merged.len());
                    for r in &merged {
                        let (cr, k) =
                            self.translate(kind, ign_group, greedy, r);
                        branches.push(self.enforce_kind(kind, k, cr));
                    }
                    (self.exprs.alt(branches), kind)
                }
            }
            AstKind::Repeat(r, i, j) => {
                let (cr, k) = self.translate(kind, ign_group, greedy, r);
                let mut rem = match j {
                    None => self.exprs.rep(greedy, k, cr),
                    Some(j) => {
                        let mut rem = EPS;
                        for _ in 0..(j - i) {
                            let copy = self.exprs.rename(cr);
                            let step = self.exprs.seq(k, copy, rem);
                            rem = if greedy {
                                self.exprs.alt(vec![step, EPS])
                            } else {
                                self.exprs.alt(vec![EPS, step])
                            };
                        }
                        rem
                    }
                };
                for _ in 0..*i {
                    let copy = self.exprs.rename(cr);
                    rem = self.exprs.seq(k, copy, rem);
                }
                (rem, kind)
            }
            AstKind::BegOfLine => {
                let cat = Category::INEXISTENT | Category::NEWLINE;
                (self.exprs.after(cat), kind)
            }
            AstKind::EndOfLine => {
                let cat = Category::INEXISTENT | Category::NEWLINE;
                (self.exprs.before(cat), kind)
            }
            AstKind::BegOfWord => {
                let a = self
                    .exprs
                    .after(Category::INEXISTENT | Category::NOT_LETTER);
                let b = self.exprs.before(Category::LETTER);
                (self.exprs.seq(MatchKind::First, a, b), kind)
            }
            AstKind::EndOfWord => {
                let a = self.exprs.after(Category::LETTER);
                let b = self
                    .exprs
                    .before(Category::INEXISTENT | Category::NOT_LETTER);
                (self.exprs.seq(MatchKind::First, a, b), kind)
            }
            AstKind::NotBound => {
                let inside_a = self.exprs.after(Category::LETTER);
                let inside_b = self.exprs.before(Category::LETTER);
                let inside =
                    self.exprs.seq(MatchKind::First, inside_a, inside_b);
                let out = Category::INEXISTENT | Category::NOT_LETTER;
                let outside_a = self.exprs.after(out);
                let outside_b = self.exprs.before(out);
                let outside =
                    self.exprs.seq(MatchKind::First, outside_a, outside_b);
                (self.exprs.alt(vec![inside, outside]), kind)
            }
            AstKind::BegOfStr => {
                (self.exprs.after(Category::INEXISTENT), kind)
            }
            AstKind::EndOfStr => {
                (self.exprs.before(Category::INEXISTENT), kind)
            }
            AstKind::LastEndOfLine => {
                let cat = Category::INEXISTENT | Category::LAST_NEWLINE;
                (self.exprs.before(cat), kind)
            }
            AstKind::Start => {
                (self.exprs.after(Category::SEARCH_BOUNDARY), kind)
            }
            AstKind::Stop => {
                (self.exprs.before(Category::SEARCH_BOUNDARY), kind)
            }
            AstKind::Sem(k, r) => {
                let (cr, inner) = self.translate(*k, ign_group, greedy, r);
                (self.enforce_kind(*k, inner, cr), *k)
            }
            AstKind::SemGreedy(g, r) => {
                self.translate(kind, ign_group, *g, r)
            }
            AstKind::Group(name, r) => {
                if ign_group {
                    return self.translate(kind, ign_group, greedy, r);
                }
                let p = self.pos;
                if let Some(name) = name {
                    self.names.push((name.clone(), p / 2));
                }
                self.pos += 2;
                let (cr, k) = self.translate(kind, ign_group, greedy, r);
                let open = self.exprs.mark(Mark::new(p));
                let close = self.exprs.mark(Mark::new(p + 1));
                let tail = self.exprs.seq(MatchKind::First, cr, close);
                (self.exprs.seq(MatchKind::First, open, tail), k)
            }
            AstKind::NoGroup(r) => self.translate(kind, true, greedy, r),
            AstKind::Nest(r) => {
                let b = self.pos;
                let (cr, k) = self.translate(kind, ign_group, greedy, r);
                if self.pos == b {
                    (cr, k)
                } else {
                    let erase = self
                        .exprs
                        .erase(Mark::new(b), Mark::new(self.pos - 1));
                    (self.exprs.seq(MatchKind::First, erase, cr), k)
                }
            }
            AstKind::Pmark(p, r) => {
                let (cr, k) = self.translate(kind, ign_group, greedy, r);
                let pm = self.exprs.pmark(*p);
                (self.exprs.seq(MatchKind::First, pm, cr), k)
            }
            AstKind::Case(_)
            | AstKind::NoCase(_)
            | AstKind::Intersection(_)
            | AstKind::Complement(_)
            | AstKind::Difference(..) => {
                unreachable!("removed by normalization")
            }
        }
    }

    fn trans_seq(
        &mut self,
        kind: MatchKind,
        ign_group: bool,
        greedy: bool,
        l: &[Ast],
    ) -> ExprId {
        match l {
            [] => EPS,
            [r] => {
                let (cr, k) = self.translate(kind, ign_group, greedy, r);
                self.enforce_kind(kind, k, cr)
            }
            [r, rest @ ..] => {
                let (head, k) = self.translate(kind, ign_group, greedy, r);
                let tail = self.trans_seq(kind, ign_group, greedy, rest);
                if self.exprs.is_eps(tail) {
                    head
                } else if self.exprs.is_eps(head) {
                    tail
                } else {
                    self.exprs.seq(k, head, tail)
                }
            }
        }
    }

    /// Reconciles an inner match kind with the enclosing one: a non-First
    /// sub-pattern inside a First context is wrapped so its own policy
    /// stays observable.
    fn enforce_kind(
        &mut self,
        kind: MatchKind,
        inner: MatchKind,
        cr: ExprId,
    ) -> ExprId {
        match (kind, inner) {
            (MatchKind::First, MatchKind::First) => cr,
            (MatchKind::First, k) => self.exprs.seq(k, cr, EPS),
            _ => cr,
        }
    }

    fn trans_set(&mut self, s: &CharSet) -> CharSet {
        if let Some(b) = s.single_byte() {
            return CharSet::single(self.cmap.color(b));
        }
        if let Some(colors) = self.cache.get(s) {
            return colors.clone();
        }
        let colors = self.cmap.translate(s);
        self.cache.insert(s.clone(), colors.clone());
        colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        alt, any, bol, bos, byte, digit, leol, named_group, opt, rep,
        rep1, seq, start, string,
    };

    #[test]
    fn anchored_analysis() {
        assert!(anchored(&bos()));
        assert!(anchored(&start()));
        assert!(anchored(&seq(vec![bos(), string("ab")])));
        assert!(anchored(&seq(vec![string("ab"), bos()])));
        assert!(anchored(&alt(vec![bos(), seq(vec![start(), digit()])])));
        assert!(anchored(&rep1(seq(vec![bos(), digit()]))));

        assert!(!anchored(&string("ab")));
        assert!(!anchored(&bol()));
        assert!(!anchored(&alt(vec![bos(), digit()])));
        assert!(!anchored(&rep(bos())));
        assert!(!anchored(&opt(bos())));
    }

    #[test]
    fn word_charset_agrees_with_categories() {
        let set = cword();
        for b in 0..=255u8 {
            assert_eq!(
                set.contains(b),
                crate::util::look::is_word_byte(b),
                "byte {:#x}",
                b,
            );
        }
    }

    #[test]
    fn merge_factors_common_heads() {
        let l = vec![string("foo"), string("foobar")];
        let merged = merge_sequences(&l);
        assert_eq!(merged.len(), 1);
        match &merged[0].kind {
            AstKind::Sequence(xs) => assert_eq!(xs[0], byte(b'f')),
            kind => panic!("expected a sequence, got {:?}", kind),
        }
    }

    #[test]
    fn merge_keeps_distinct_heads_apart() {
        let l = vec![string("ab"), string("cd")];
        assert_eq!(merge_sequences(&l).len(), 2);
    }

    #[test]
    fn compile_allocates_group_zero() {
        let prog = compile(&named_group("n", digit()));
        assert_eq!(prog.group_count, 2);
        assert_eq!(prog.group_names, vec![("n".to_string(), 1)]);
    }

    #[test]
    fn compile_reserves_last_newline_color() {
        let prog = compile(&seq(vec![string("x"), leol()]));
        assert_eq!(prog.lnl, Some(prog.ncolor - 1));

        let prog = compile(&string("x"));
        assert_eq!(prog.lnl, None);
    }

    #[test]
    fn unanchored_patterns_get_few_colors() {
        // Bytes below 'x', 'x' itself, bytes above it. The implicit any*
        // prefix must not split the alphabet further.
        let prog = compile(&string("x"));
        assert_eq!(prog.ncolor, 3);
        let prog = compile(&any());
        assert_eq!(prog.ncolor, 1);
    }
}
