/*!
The lazy DFA driver.

The driver executes a compiled [`Program`] by determinizing the marked NFA
on the fly. DFA states live in a growable vector and are addressed by
[`StateID`]; a hash map interns them by their NFA image so that equal
states are built only once. Each state owns a transition table with one
slot per color, initially filled with the id of a shared "unknown"
sentinel (slot 0 of the vector). The hot loop therefore costs one indexed
load plus one comparison per input byte; only a sentinel hit falls into
the slow path that computes the missing transition.

A state whose NFA image has already matched or failed is a *break* state:
its `idx` field holds [`BREAK`] and scanning stops as soon as one is
entered. Otherwise `idx` is the position-array slot assigned to the state
by the working area; the scan loop writes the current input position
(biased by one) into that slot every time the state is entered, which is
how capture marks get their values.

The end-of-input boundary check does not go through the transition table:
it depends on the category at the end of the search window, so it is
memoized per category on each state.
*/

use std::collections::HashMap;

use crate::compile::Program;
use crate::nfa::{self, Marks, State as NfaState, Status, WorkingArea};
use crate::util::look::Category;
use crate::util::primitives::StateID;

/// The `idx` of the shared sentinel standing in for not-yet-computed
/// transitions.
const UNKNOWN: i32 = -2;
/// The `idx` of states where scanning must stop: their NFA image has
/// already matched or failed, whatever input follows.
const BREAK: i32 = -3;

#[derive(Clone, Debug)]
struct LazyState {
    /// `>= 0`: the position slot of this state. [`BREAK`] or [`UNKNOWN`]
    /// otherwise.
    idx: i32,
    /// The position slot regardless of break status.
    real_idx: i32,
    /// One slot per color, [`StateID::UNKNOWN`] until computed.
    next: Box<[StateID]>,
    /// Memoized end-of-input transitions, keyed by boundary category.
    finals: Vec<(Category, (i32, Status))>,
    desc: NfaState,
}

/// The lazily populated DFA of one compiled regex.
#[derive(Clone, Debug)]
pub(crate) struct Cache {
    states: Vec<LazyState>,
    interned: HashMap<NfaState, StateID>,
    initial: Vec<(Category, StateID)>,
    area: WorkingArea,
}

impl Cache {
    pub(crate) fn new() -> Cache {
        let sentinel = LazyState {
            idx: UNKNOWN,
            real_idx: UNKNOWN,
            next: Box::from([]),
            finals: Vec::new(),
            desc: NfaState {
                idx: 0,
                category: Category::default(),
                desc: Vec::new(),
            },
        };
        Cache {
            states: vec![sentinel],
            interned: HashMap::new(),
            initial: Vec::new(),
            area: WorkingArea::new(),
        }
    }

    /// The number of materialized states, the sentinel excluded.
    pub(crate) fn state_count(&self) -> usize {
        self.states.len() - 1
    }
}

/// The outcome of one match attempt.
#[derive(Clone, Debug)]
pub(crate) enum MatchResult {
    /// The marks of the winning thread together with the position array
    /// its slots point into.
    Match { marks: Marks, gpos: Vec<usize> },
    Failed,
    /// Only produced in partial mode: the input ended while threads were
    /// still alive.
    Running { no_match_starts_before: usize },
}

/// Runs one match attempt over `haystack[pos..last]`.
///
/// `groups` controls whether capture positions are recorded; `partial`
/// switches the end-of-input handling to report `Running` instead of
/// resolving the boundary as a definite end.
pub(crate) fn match_str(
    prog: &Program,
    cache: &mut Cache,
    groups: bool,
    partial: bool,
    haystack: &[u8],
    pos: usize,
    last: usize,
) -> MatchResult {
    let mut positions = if groups {
        let n = cache.area.index_count() + 1;
        vec![0usize; n.max(10)]
    } else {
        Vec::new()
    };

    let init_cat = Category::SEARCH_BOUNDARY
        | if pos == 0 {
            Category::INEXISTENT
        } else {
            byte_category(prog, haystack[pos - 1])
        };
    let init = find_initial(prog, cache, &mut positions, init_cat);
    let st = scan(prog, cache, &mut positions, haystack, pos, last, init, groups);

    let is_break = cache.states[st.as_usize()].idx == BREAK;
    let scan_status = cache.states[st.as_usize()].desc.status();
    let status = if is_break || (partial && !groups) {
        scan_status
    } else if partial {
        match scan_status {
            Status::Running => {
                // The window may end exactly where a match completes; only
                // the boundary transition can tell.
                let cat = Category::SEARCH_BOUNDARY | Category::INEXISTENT;
                let (idx, status) =
                    final_transition(prog, cache, &mut positions, st, cat);
                match status {
                    Status::Match(_) => {
                        positions[idx as usize] = last + 1;
                        status
                    }
                    _ => Status::Running,
                }
            }
            status => status,
        }
    } else {
        let cat = Category::SEARCH_BOUNDARY
            | if last == haystack.len() {
                Category::INEXISTENT
            } else {
                byte_category(prog, haystack[last])
            };
        let (idx, status) =
            final_transition(prog, cache, &mut positions, st, cat);
        if groups {
            positions[idx as usize] = last + 1;
        }
        status
    };

    match status {
        Status::Match(marks) => MatchResult::Match { marks, gpos: positions },
        Status::Failed => MatchResult::Failed,
        Status::Running => MatchResult::Running {
            no_match_starts_before: if groups {
                positions[0].saturating_sub(1)
            } else {
                0
            },
        },
    }
}

/// The category a byte exposes to anchors, computed through its color's
/// representative. The coloring pass guarantees the representative and
/// the byte agree on every category the pattern can observe.
fn byte_category(prog: &Program, b: u8) -> Category {
    color_category(prog, prog.cmap.color(b) as i32)
}

fn color_category(prog: &Program, color: i32) -> Category {
    if color < 0 {
        Category::INEXISTENT
    } else if Some(color as usize) == prog.lnl {
        Category::LAST_NEWLINE | Category::NEWLINE | Category::NOT_LETTER
    } else {
        Category::from_byte(prog.cmap.repr(color as usize))
    }
}

fn scan(
    prog: &Program,
    cache: &mut Cache,
    positions: &mut Vec<usize>,
    haystack: &[u8],
    pos: usize,
    last: usize,
    init: StateID,
    groups: bool,
) -> StateID {
    // A trailing newline at the very end of the haystack gets the
    // synthetic last-newline color: scan up to it normally, then take one
    // transition over the synthetic color.
    let use_lnl = last == haystack.len()
        && prog.lnl.is_some()
        && last > pos
        && haystack[last - 1] == b'\n';
    let scan_last = if use_lnl { last - 1 } else { last };
    let st = if groups {
        scan_marked(prog, cache, positions, haystack, pos, scan_last, init)
    } else {
        scan_unmarked(prog, cache, positions, haystack, pos, scan_last, init)
    };
    if use_lnl && cache.states[st.as_usize()].idx != BREAK {
        last_newline_transition(prog, cache, positions, st, last - 1, groups)
    } else {
        st
    }
}

fn scan_marked(
    prog: &Program,
    cache: &mut Cache,
    positions: &mut Vec<usize>,
    haystack: &[u8],
    mut at: usize,
    last: usize,
    mut cur: StateID,
) -> StateID {
    while at < last {
        let color = prog.cmap.color(haystack[at]) as usize;
        let next = cache.states[cur.as_usize()].next[color];
        let (idx, real_idx) = {
            let st = &cache.states[next.as_usize()];
            (st.idx, st.real_idx)
        };
        if idx >= 0 {
            at += 1;
            positions[idx as usize] = at;
            cur = next;
        } else if idx == BREAK {
            at += 1;
            positions[real_idx as usize] = at;
            return next;
        } else {
            // Unknown sentinel: compute the transition, then retry the
            // same input position.
            compute_transition(prog, cache, positions, cur, color);
        }
    }
    cur
}

fn scan_unmarked(
    prog: &Program,
    cache: &mut Cache,
    positions: &mut Vec<usize>,
    haystack: &[u8],
    mut at: usize,
    last: usize,
    mut cur: StateID,
) -> StateID {
    while at < last {
        let color = prog.cmap.color(haystack[at]) as usize;
        let next = cache.states[cur.as_usize()].next[color];
        let idx = cache.states[next.as_usize()].idx;
        if idx >= 0 {
            at += 1;
            cur = next;
        } else if idx == BREAK {
            return next;
        } else {
            compute_transition(prog, cache, positions, cur, color);
        }
    }
    cur
}

/// Takes the single transition over the synthetic last-newline color,
/// computing it on the first use.
fn last_newline_transition(
    prog: &Program,
    cache: &mut Cache,
    positions: &mut Vec<usize>,
    cur: StateID,
    at: usize,
    groups: bool,
) -> StateID {
    let lnl = prog.lnl.expect("last-newline color is reserved");
    loop {
        let next = cache.states[cur.as_usize()].next[lnl];
        let (idx, real_idx) = {
            let st = &cache.states[next.as_usize()];
            (st.idx, st.real_idx)
        };
        if idx >= 0 {
            if groups {
                positions[idx as usize] = at + 1;
            }
            return next;
        } else if idx == BREAK {
            if groups {
                positions[real_idx as usize] = at + 1;
            }
            return next;
        }
        let cat = Category::LAST_NEWLINE
            | Category::NEWLINE
            | Category::NOT_LETTER;
        let desc = {
            let Cache { states, area, .. } = &mut *cache;
            nfa::delta(
                &prog.exprs,
                area,
                cat,
                lnl as i32,
                &states[cur.as_usize()].desc,
            )
        };
        let id = find_state(prog, cache, positions, desc);
        cache.states[cur.as_usize()].next[lnl] = id;
    }
}

fn compute_transition(
    prog: &Program,
    cache: &mut Cache,
    positions: &mut Vec<usize>,
    cur: StateID,
    color: usize,
) {
    let cat = color_category(prog, color as i32);
    let desc = {
        let Cache { states, area, .. } = &mut *cache;
        nfa::delta(
            &prog.exprs,
            area,
            cat,
            color as i32,
            &states[cur.as_usize()].desc,
        )
    };
    let next = find_state(prog, cache, positions, desc);
    cache.states[cur.as_usize()].next[color] = next;
}

/// The end-of-input transition out of `cur` under the given boundary
/// category. Returns the position slot of the resulting state and its
/// status.
fn final_transition(
    prog: &Program,
    cache: &mut Cache,
    positions: &mut Vec<usize>,
    cur: StateID,
    cat: Category,
) -> (i32, Status) {
    let memo = cache.states[cur.as_usize()]
        .finals
        .iter()
        .find(|&&(c, _)| c == cat)
        .map(|(_, res)| res.clone());
    if let Some(res) = memo {
        return res;
    }
    let desc = {
        let Cache { states, area, .. } = &mut *cache;
        nfa::delta(&prog.exprs, area, cat, -1, &states[cur.as_usize()].desc)
    };
    let id = find_state(prog, cache, positions, desc);
    let res = {
        let st = &cache.states[id.as_usize()];
        (st.real_idx, st.desc.status())
    };
    cache.states[cur.as_usize()].finals.push((cat, res.clone()));
    res
}

fn find_initial(
    prog: &Program,
    cache: &mut Cache,
    positions: &mut Vec<usize>,
    cat: Category,
) -> StateID {
    if let Some(&(_, id)) =
        cache.initial.iter().find(|&&(c, _)| c == cat)
    {
        return id;
    }
    let desc = NfaState::initial(cat, prog.init);
    let id = find_state(prog, cache, positions, desc);
    cache.initial.push((cat, id));
    id
}

/// Interns an NFA state, materializing its DFA state on first sight. The
/// position array is grown when the new state's slot does not fit yet.
fn find_state(
    prog: &Program,
    cache: &mut Cache,
    positions: &mut Vec<usize>,
    desc: NfaState,
) -> StateID {
    if let Some(&id) = cache.interned.get(&desc) {
        return id;
    }
    if !positions.is_empty() {
        while positions.len() <= desc.idx as usize {
            let len = positions.len();
            positions.resize(2 * len, 0);
        }
    }
    let idx = match desc.status() {
        Status::Running => desc.idx,
        _ => BREAK,
    };
    let st = LazyState {
        idx,
        real_idx: desc.idx,
        next: vec![StateID::UNKNOWN; prog.ncolor].into_boxed_slice(),
        finals: Vec::new(),
        desc: desc.clone(),
    };
    let id = StateID::new(cache.states.len());
    cache.states.push(st);
    cache.interned.insert(desc, id);
    trace!(
        "materialized DFA state {} (slot {}, break: {})",
        id.as_usize(),
        idx.max(-1),
        idx == BREAK,
    );
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::string;
    use crate::compile::compile;

    fn run(
        prog: &Program,
        cache: &mut Cache,
        haystack: &[u8],
    ) -> MatchResult {
        match_str(prog, cache, true, false, haystack, 0, haystack.len())
    }

    #[test]
    fn states_are_interned_across_matches() {
        let prog = compile(&string("ab"));
        let mut cache = Cache::new();
        assert!(matches!(
            run(&prog, &mut cache, b"xxab"),
            MatchResult::Match { .. }
        ));
        let states = cache.state_count();
        assert!(states > 0);
        // Matching the same input again computes no new states.
        assert!(matches!(
            run(&prog, &mut cache, b"xxab"),
            MatchResult::Match { .. }
        ));
        assert_eq!(cache.state_count(), states);
    }

    #[test]
    fn mismatch_reports_failed() {
        let prog = compile(&crate::ast::seq(vec![
            crate::ast::bos(),
            string("a"),
        ]));
        let mut cache = Cache::new();
        assert!(matches!(
            run(&prog, &mut cache, b"b"),
            MatchResult::Failed
        ));
    }
}
