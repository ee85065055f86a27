/*!
The marked NFA: expression nodes, thread descriptors and the transition
function.

An NFA expression is a DAG of nodes allocated in an arena ([`Exprs`]) and
addressed by [`ExprId`]. Node equality is id equality, which is what makes
thread deduplication cheap: two threads sitting at the same node are
indistinguishable except for their priority, so only the higher priority
one is kept.

An NFA *state* is an ordered list of threads, highest priority first. Each
thread records where it sits in the expression and which capture marks it
has crossed so far. The [`delta`] function advances a whole state over one
input color, producing the ordered thread list of the successor state. The
DFA driver interns these states, so `State` is hashable and comparable.

Capture positions are not stored in threads directly. Instead, a mark
crossed during a transition is first recorded as "now" (-1) and then
resolved by [`delta`] to the slot index of the state being built; the
driver writes the input position into that slot whenever the state is
entered. The working area hands out slot indices so that a state's own
slot never collides with a slot referenced by any of its threads.
*/

use crate::ast::MatchKind;
use crate::util::alphabet::CharSet;
use crate::util::look::Category;
use crate::util::primitives::{ExprId, Mark, Pmark, PmarkSet};

/// The shared epsilon node, allocated at slot 0 of every arena.
pub(crate) const EPS: ExprId = ExprId::new(0);

/// The forms an NFA node can take. Character sets are expressed in colors,
/// not bytes; the translation happens during compilation.
#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    /// Consume one input color from the given set.
    Set(CharSet),
    /// Ordered alternation.
    Alt(Vec<ExprId>),
    /// Sequencing, with the semantics governing how an inner match is
    /// resolved against the continuation.
    Seq(MatchKind, ExprId, ExprId),
    /// The empty word.
    Eps,
    /// Unbounded repetition. The flag is true when greedy.
    Rep(bool, MatchKind, ExprId),
    /// Record a capture boundary.
    Mark(Mark),
    /// Forget all capture marks in the inclusive range. Used when
    /// re-entering a nested group so stale iterations do not leak.
    Erase(Mark, Mark),
    /// Zero-width check on the category of the next position.
    Before(Category),
    /// Zero-width check on the category of the previous position.
    After(Category),
    /// Record a priority mark.
    Pmark(Pmark),
}

/// The NFA expression arena.
#[derive(Clone, Debug)]
pub(crate) struct Exprs {
    nodes: Vec<NodeKind>,
}

impl Exprs {
    pub(crate) fn new() -> Exprs {
        Exprs { nodes: vec![NodeKind::Eps] }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn kind(&self, id: ExprId) -> &NodeKind {
        &self.nodes[id.as_usize()]
    }

    #[inline]
    pub(crate) fn is_eps(&self, id: ExprId) -> bool {
        matches!(self.kind(id), NodeKind::Eps)
    }

    fn push(&mut self, kind: NodeKind) -> ExprId {
        let id = ExprId::new(self.nodes.len());
        self.nodes.push(kind);
        id
    }

    pub(crate) fn cst(&mut self, set: CharSet) -> ExprId {
        self.push(NodeKind::Set(set))
    }

    /// An alternation. Empty lists yield a node matching nothing at all;
    /// singleton lists are inlined.
    pub(crate) fn alt(&mut self, l: Vec<ExprId>) -> ExprId {
        match l.len() {
            1 => l[0],
            _ => self.push(NodeKind::Alt(l)),
        }
    }

    /// A sequence. Epsilon operands are absorbed where that cannot change
    /// the observable match kind.
    pub(crate) fn seq(
        &mut self,
        kind: MatchKind,
        x: ExprId,
        y: ExprId,
    ) -> ExprId {
        if self.is_eps(x) {
            y
        } else if self.is_eps(y) && kind == MatchKind::First {
            x
        } else {
            self.push(NodeKind::Seq(kind, x, y))
        }
    }

    pub(crate) fn rep(
        &mut self,
        greedy: bool,
        kind: MatchKind,
        x: ExprId,
    ) -> ExprId {
        self.push(NodeKind::Rep(greedy, kind, x))
    }

    pub(crate) fn mark(&mut self, m: Mark) -> ExprId {
        self.push(NodeKind::Mark(m))
    }

    pub(crate) fn erase(&mut self, b: Mark, e: Mark) -> ExprId {
        self.push(NodeKind::Erase(b, e))
    }

    pub(crate) fn before(&mut self, cat: Category) -> ExprId {
        self.push(NodeKind::Before(cat))
    }

    pub(crate) fn after(&mut self, cat: Category) -> ExprId {
        self.push(NodeKind::After(cat))
    }

    pub(crate) fn pmark(&mut self, p: Pmark) -> ExprId {
        self.push(NodeKind::Pmark(p))
    }

    /// Deep-copies an expression with fresh node ids. Mark identities are
    /// preserved; only the node identities change, so threads from
    /// distinct copies never deduplicate against each other.
    pub(crate) fn rename(&mut self, x: ExprId) -> ExprId {
        match self.kind(x).clone() {
            NodeKind::Eps => EPS,
            NodeKind::Alt(l) => {
                let l = l.into_iter().map(|y| self.rename(y)).collect();
                self.push(NodeKind::Alt(l))
            }
            NodeKind::Seq(kind, y, z) => {
                let y = self.rename(y);
                let z = self.rename(z);
                self.push(NodeKind::Seq(kind, y, z))
            }
            NodeKind::Rep(greedy, kind, y) => {
                let y = self.rename(y);
                self.push(NodeKind::Rep(greedy, kind, y))
            }
            kind => self.push(kind),
        }
    }
}

/// The capture and priority marks accumulated by one thread.
///
/// `marks` associates a mark with the position slot where it was last
/// crossed, most recently crossed first. The value -1 stands for "during
/// the transition currently being computed" and is resolved to the slot of
/// the destination state before that state is finished.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) struct Marks {
    pub(crate) marks: Vec<(Mark, i32)>,
    pub(crate) pmarks: PmarkSet,
}

impl Marks {
    fn set_mark(&self, m: Mark) -> Marks {
        let mut marks = Vec::with_capacity(self.marks.len() + 1);
        marks.push((m, -1));
        marks.extend(self.marks.iter().copied().filter(|&(i, _)| i != m));
        Marks { marks, pmarks: self.pmarks.clone() }
    }

    fn set_pmark(&self, p: Pmark) -> Marks {
        let mut out = self.clone();
        out.pmarks.insert(p);
        out
    }

    fn erase(&self, b: Mark, e: Mark) -> Marks {
        let marks = self
            .marks
            .iter()
            .copied()
            .filter(|&(i, _)| i < b || i > e)
            .collect();
        Marks { marks, pmarks: self.pmarks.clone() }
    }

    fn resolve(&mut self, idx: i32) {
        for (_, v) in self.marks.iter_mut() {
            if *v == -1 {
                *v = idx;
            }
        }
    }
}

/// One thread of execution inside an NFA state, in decreasing priority
/// order within the enclosing list.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Thread {
    /// Threads inside the left part of a sequence, with the continuation
    /// they will enter once the left part matches.
    Seq(Vec<Thread>, ExprId, MatchKind),
    /// A thread positioned at the given expression.
    Exp(Marks, ExprId),
    /// A thread that has matched.
    Match(Marks),
}

/// An interned NFA state: a slot index, the category of the transition
/// that produced it, and the prioritized thread list.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct State {
    pub(crate) idx: i32,
    pub(crate) category: Category,
    pub(crate) desc: Vec<Thread>,
}

/// The classification of an NFA state.
#[derive(Clone, Debug)]
pub(crate) enum Status {
    /// No thread is alive: no match can ever be produced from here.
    Failed,
    /// Threads are alive but none has matched yet.
    Running,
    /// The highest priority thread has matched, with these marks.
    Match(Marks),
}

impl State {
    pub(crate) fn initial(cat: Category, e: ExprId) -> State {
        State {
            idx: 0,
            category: cat,
            desc: vec![Thread::Exp(Marks::default(), e)],
        }
    }

    /// The status is decided by the head of the thread list: a match
    /// anywhere else is shadowed by a higher priority running thread.
    pub(crate) fn status(&self) -> Status {
        match self.desc.first() {
            None => Status::Failed,
            Some(Thread::Match(m)) => Status::Match(m.clone()),
            Some(_) => Status::Running,
        }
    }
}

/// Hands out position-array slots for freshly built states.
///
/// A state's slot must differ from every slot referenced by the marks of
/// its own threads: the driver overwrites `positions[state.idx]` each time
/// the state is entered, and a collision would clobber a live capture.
#[derive(Clone, Debug)]
pub(crate) struct WorkingArea {
    used: Vec<bool>,
}

impl WorkingArea {
    pub(crate) fn new() -> WorkingArea {
        WorkingArea { used: vec![false] }
    }

    /// An upper bound (exclusive) on every slot handed out so far.
    pub(crate) fn index_count(&self) -> usize {
        self.used.len()
    }

    fn free_index(&mut self, desc: &[Thread]) -> i32 {
        self.used.iter_mut().for_each(|b| *b = false);
        mark_used(&mut self.used, desc);
        let len = self.used.len();
        let idx = self.used.iter().position(|&b| !b).unwrap_or(len);
        if idx == len {
            self.used = vec![false; 2 * len];
        }
        idx as i32
    }
}

fn mark_used(used: &mut [bool], desc: &[Thread]) {
    for t in desc {
        match t {
            Thread::Seq(l, _, _) => mark_used(used, l),
            Thread::Exp(marks, _) | Thread::Match(marks) => {
                for &(_, v) in &marks.marks {
                    if v >= 0 {
                        used[v as usize] = true;
                    }
                }
            }
        }
    }
}

struct DeltaCtx<'a> {
    exprs: &'a Exprs,
    prev_cat: Category,
    next_cat: Category,
    /// The input color consumed by this transition, or -1 for the final
    /// end-of-input transition which consumes nothing.
    color: i32,
}

/// Advances the state `st` over one input color under the given category,
/// producing the successor state.
pub(crate) fn delta(
    exprs: &Exprs,
    area: &mut WorkingArea,
    next_cat: Category,
    color: i32,
    st: &State,
) -> State {
    let ctx =
        DeltaCtx { exprs, prev_cat: st.category, next_cat, color };
    let mut threads = Vec::new();
    for t in &st.desc {
        delta_thread(&ctx, t, &mut threads);
    }
    let mut seen = Vec::new();
    let mut desc = Vec::with_capacity(threads.len());
    remove_duplicates(exprs, &mut seen, threads, EPS, &mut desc);
    let idx = area.free_index(&desc);
    resolve_idx(&mut desc, idx);
    State { idx, category: next_cat, desc }
}

fn delta_thread(ctx: &DeltaCtx, t: &Thread, out: &mut Vec<Thread>) {
    match t {
        Thread::Seq(l, z, kind) => {
            let mut inner = Vec::new();
            for t in l {
                delta_thread(ctx, t, &mut inner);
            }
            delta_seq(ctx, *kind, inner, *z, out);
        }
        Thread::Exp(marks, e) => delta_expr(ctx, marks, *e, out),
        // A completed thread stays completed: it is the fallback match
        // while higher priority threads keep running, and its slots are
        // protected from reuse by the working area.
        Thread::Match(m) => out.push(Thread::Match(m.clone())),
    }
}

fn delta_expr(
    ctx: &DeltaCtx,
    marks: &Marks,
    x: ExprId,
    out: &mut Vec<Thread>,
) {
    match ctx.exprs.kind(x) {
        NodeKind::Set(s) => {
            if ctx.color >= 0 && s.contains(ctx.color as u8) {
                out.push(Thread::Exp(marks.clone(), EPS));
            }
        }
        NodeKind::Alt(l) => {
            for &y in l {
                delta_expr(ctx, marks, y, out);
            }
        }
        NodeKind::Seq(kind, y, z) => {
            let mut inner = Vec::new();
            delta_expr(ctx, marks, *y, &mut inner);
            delta_seq(ctx, *kind, inner, *z, out);
        }
        NodeKind::Rep(greedy, kind, y) => {
            let mut inner = Vec::new();
            delta_expr(ctx, marks, *y, &mut inner);
            let exit_marks = match first_match(&inner) {
                None => marks.clone(),
                Some(m) => {
                    remove_matches(&mut inner);
                    m
                }
            };
            if *greedy {
                push_tseq(ctx.exprs, *kind, inner, x, out);
                out.push(Thread::Match(exit_marks));
            } else {
                out.push(Thread::Match(marks.clone()));
                push_tseq(ctx.exprs, *kind, inner, x, out);
            }
        }
        NodeKind::Eps => out.push(Thread::Match(marks.clone())),
        NodeKind::Mark(m) => out.push(Thread::Match(marks.set_mark(*m))),
        NodeKind::Pmark(p) => {
            out.push(Thread::Match(marks.set_pmark(*p)))
        }
        NodeKind::Erase(b, e) => {
            out.push(Thread::Match(marks.erase(*b, *e)))
        }
        NodeKind::Before(cat) => {
            if ctx.next_cat.intersects(*cat) {
                out.push(Thread::Match(marks.clone()));
            }
        }
        NodeKind::After(cat) => {
            if ctx.prev_cat.intersects(*cat) {
                out.push(Thread::Match(marks.clone()));
            }
        }
    }
}

/// Combines the advanced threads `y` of the left part of a sequence with
/// its continuation `z`. When some thread of `y` has matched, the match
/// kind decides whether the continuation's threads are ranked before the
/// still-running left threads (shortest), after them (longest), or
/// exactly at the priority the matching thread held (first).
fn delta_seq(
    ctx: &DeltaCtx,
    kind: MatchKind,
    y: Vec<Thread>,
    z: ExprId,
    out: &mut Vec<Thread>,
) {
    match first_match(&y) {
        None => push_tseq(ctx.exprs, kind, y, z, out),
        Some(marks) => match kind {
            MatchKind::Longest => {
                let mut y = y;
                remove_matches(&mut y);
                push_tseq(ctx.exprs, kind, y, z, out);
                delta_expr(ctx, &marks, z, out);
            }
            MatchKind::Shortest => {
                delta_expr(ctx, &marks, z, out);
                let mut y = y;
                remove_matches(&mut y);
                push_tseq(ctx.exprs, kind, y, z, out);
            }
            MatchKind::First => {
                let (before, after) = split_at_match(y);
                push_tseq(ctx.exprs, kind, before, z, out);
                delta_expr(ctx, &marks, z, out);
                push_tseq(ctx.exprs, kind, after, z, out);
            }
        },
    }
}

/// Pushes the thread list `x` as the left part of a sequence with
/// continuation `y`. A left part consisting of a single completed thread
/// collapses to a plain thread positioned at the continuation.
fn push_tseq(
    exprs: &Exprs,
    kind: MatchKind,
    mut x: Vec<Thread>,
    y: ExprId,
    out: &mut Vec<Thread>,
) {
    if x.is_empty() {
        return;
    }
    if x.len() == 1 {
        if let Thread::Exp(_, e) = &x[0] {
            if exprs.is_eps(*e) {
                match x.pop() {
                    Some(Thread::Exp(marks, _)) => {
                        out.push(Thread::Exp(marks, y));
                        return;
                    }
                    _ => unreachable!(),
                }
            }
        }
    }
    out.push(Thread::Seq(x, y, kind));
}

fn first_match(threads: &[Thread]) -> Option<Marks> {
    threads.iter().find_map(|t| match t {
        Thread::Match(m) => Some(m.clone()),
        _ => None,
    })
}

fn remove_matches(threads: &mut Vec<Thread>) {
    threads.retain(|t| !matches!(t, Thread::Match(_)));
}

/// Splits a thread list at its first match. The matching thread itself is
/// dropped (its marks are re-injected into the continuation by the
/// caller) and so is any lower priority match.
fn split_at_match(threads: Vec<Thread>) -> (Vec<Thread>, Vec<Thread>) {
    let pos = threads
        .iter()
        .position(|t| matches!(t, Thread::Match(_)))
        .expect("split_at_match requires a match");
    let mut before = threads;
    let mut after = before.split_off(pos);
    after.remove(0);
    remove_matches(&mut after);
    (before, after)
}

/// Drops duplicate threads, keeping the highest priority occurrence of
/// each expression position, and truncates everything below the first
/// match (those threads can never win).
///
/// Completed threads (sitting at an epsilon) are keyed by the
/// continuation `y` they are about to enter, not by the epsilon node.
fn remove_duplicates(
    exprs: &Exprs,
    seen: &mut Vec<ExprId>,
    threads: Vec<Thread>,
    y: ExprId,
    out: &mut Vec<Thread>,
) {
    for t in threads {
        match t {
            Thread::Match(m) => {
                out.push(Thread::Match(m));
                break;
            }
            Thread::Seq(l, x, kind) => {
                let mut inner = Vec::with_capacity(l.len());
                remove_duplicates(exprs, seen, l, x, &mut inner);
                push_tseq(exprs, kind, inner, x, out);
            }
            Thread::Exp(marks, x) => {
                let key = if exprs.is_eps(x) { y } else { x };
                if !seen.contains(&key) {
                    seen.push(key);
                    out.push(Thread::Exp(marks, x));
                }
            }
        }
    }
}

fn resolve_idx(desc: &mut [Thread], idx: i32) {
    for t in desc {
        match t {
            Thread::Seq(l, _, _) => resolve_idx(l, idx),
            Thread::Exp(marks, _) => marks.resolve(idx),
            Thread::Match(marks) => marks.resolve(idx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(
        exprs: &Exprs,
        area: &mut WorkingArea,
        color: i32,
        cat: Category,
        st: &State,
    ) -> State {
        delta(exprs, area, cat, color, st)
    }

    #[test]
    fn single_color_lifecycle() {
        let mut exprs = Exprs::new();
        let cst = exprs.cst(CharSet::single(0));
        let mut area = WorkingArea::new();
        let init = State::initial(Category::INEXISTENT, cst);
        assert!(matches!(init.status(), Status::Running));

        // Consuming color 0 leaves one completed-but-for-epsilon thread.
        let st = advance(&exprs, &mut area, 0, Category::LETTER, &init);
        assert!(matches!(st.status(), Status::Running));

        // The end-of-input transition then produces the match.
        let fin =
            advance(&exprs, &mut area, -1, Category::INEXISTENT, &st);
        assert!(matches!(fin.status(), Status::Match(_)));

        // A wrong color kills every thread.
        let dead = advance(&exprs, &mut area, 1, Category::LETTER, &init);
        assert!(matches!(dead.status(), Status::Failed));
        assert!(dead.desc.is_empty());
    }

    #[test]
    fn alternation_prefers_first_branch() {
        let mut exprs = Exprs::new();
        let a = exprs.cst(CharSet::single(0));
        let b = exprs.cst(CharSet::single(0));
        let alt = exprs.alt(vec![a, b]);
        let mut area = WorkingArea::new();
        let init = State::initial(Category::INEXISTENT, alt);
        let st = advance(&exprs, &mut area, 0, Category::LETTER, &init);
        // Both branches consumed the color, but they land on the shared
        // epsilon and deduplicate down to a single thread.
        assert_eq!(st.desc.len(), 1);
    }

    #[test]
    fn free_index_avoids_live_slots() {
        let mut area = WorkingArea::new();
        let with_slots = |slots: &[i32]| {
            let marks = Marks {
                marks: slots
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| (Mark::new(i), v))
                    .collect(),
                pmarks: PmarkSet::default(),
            };
            vec![Thread::Match(marks)]
        };
        // Slot 0 is referenced, so the state gets slot 1 and the area
        // grows to make room for it.
        assert_eq!(area.free_index(&with_slots(&[0])), 1);
        assert!(area.index_count() >= 2);
        // With both low slots referenced, the next state gets slot 2.
        assert_eq!(area.free_index(&with_slots(&[0, 1])), 2);
        assert!(area.index_count() >= 3);
        // A state referencing nothing reuses slot 0.
        assert_eq!(area.free_index(&with_slots(&[])), 0);
    }

    #[test]
    fn marks_erase_range() {
        let m = Marks::default()
            .set_mark(Mark::new(0))
            .set_mark(Mark::new(1))
            .set_mark(Mark::new(4));
        let erased = m.erase(Mark::new(0), Mark::new(1));
        let left: Vec<usize> =
            erased.marks.iter().map(|&(i, _)| i.as_usize()).collect();
        assert_eq!(left, vec![4]);
    }
}
