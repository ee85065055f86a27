use regex_comb::{
    alt, bos, byte, compl, digit, eol, group, inter, leol, longest, mark,
    named_group, nest, no_case, no_group, rep, rep1, seq, start, string,
    whole_string, word, Builder, Input, MatchKind, Regex,
};

fn span(re: &Regex, haystack: &str) -> Option<(usize, usize)> {
    re.find(haystack).map(|m| (m.start(), m.end()))
}

#[test]
fn literal_match_in_the_middle() {
    let re = Regex::new(&string("abc"));
    assert_eq!(span(&re, "xxabcyy"), Some((2, 5)));
    let caps = re.captures("xxabcyy").unwrap();
    assert_eq!(&caps[0], b"abc");
}

#[test]
fn sequence_with_repetition() {
    let re = Regex::new(&seq(vec![
        string("a"),
        rep(byte(b'b')),
        string("c"),
    ]));
    assert_eq!(span(&re, "abbbc"), Some((0, 5)));
    assert_eq!(span(&re, "ac"), Some((0, 2)));
    assert_eq!(span(&re, "abxc"), None);
}

#[test]
fn alternation_is_first_match_by_default() {
    let pat = alt(vec![string("foo"), string("foobar")]);
    let re = Regex::new(&pat);
    assert_eq!(span(&re, "foobar"), Some((0, 3)));

    let re = Regex::new(&longest(pat));
    assert_eq!(span(&re, "foobar"), Some((0, 6)));
}

#[test]
fn completed_alternative_survives_while_longer_one_runs() {
    // "ab|a": the first branch is preferred, but once it dies the
    // already-completed second branch must still win.
    let re = Regex::new(&alt(vec![string("ab"), string("a")]));
    assert_eq!(span(&re, "ab"), Some((0, 2)));
    assert_eq!(span(&re, "ac"), Some((0, 1)));

    // Same under longest semantics: the longer candidate failing must
    // fall back to the shorter completed match.
    let re = Regex::new(&longest(alt(vec![
        string("foo"),
        string("foobar"),
    ])));
    assert_eq!(span(&re, "foobaz"), Some((0, 3)));
}

#[test]
fn eol_matches_before_final_newline_and_at_end() {
    let re = Regex::new(&seq(vec![string("x"), eol()]));
    assert_eq!(span(&re, "x\n"), Some((0, 1)));
    assert_eq!(span(&re, "x"), Some((0, 1)));
    assert_eq!(span(&re, "xy"), None);
    // An interior newline counts too.
    assert_eq!(span(&re, "x\ny"), Some((0, 1)));
}

#[test]
fn last_eol_ignores_interior_newlines() {
    let re = Regex::new(&seq(vec![string("x"), leol()]));
    assert_eq!(span(&re, "x\n"), Some((0, 1)));
    assert_eq!(span(&re, "x"), Some((0, 1)));
    // The newline after the first 'x' is not the last one.
    assert_eq!(span(&re, "x\nx\n"), Some((2, 3)));
}

#[test]
fn case_folding_matches_all_combinations() {
    let re = Regex::new(&no_case(string("abc")));
    for s in
        ["abc", "abC", "aBc", "aBC", "Abc", "AbC", "ABc", "ABC"]
    {
        assert_eq!(span(&re, s), Some((0, 3)), "input {:?}", s);
    }
    assert_eq!(span(&re, "abd"), None);
}

#[test]
fn complement_never_matches_excluded_bytes() {
    let re = Regex::new(&rep1(compl(vec![digit()])));
    let caps = re.captures("12ab34").unwrap();
    assert_eq!(&caps[0], b"ab");
}

#[test]
fn intersection_evaluates_to_common_bytes() {
    // Hex digits that are also letters.
    let re = Regex::new(&inter(vec![
        regex_comb::xdigit(),
        regex_comb::alpha(),
    ]));
    assert!(re.is_match("f"));
    assert!(!re.is_match("5"));
    assert!(!re.is_match("z"));
}

#[test]
fn groups_report_offsets_and_absence() {
    let pat = seq(vec![
        group(string("a")),
        alt(vec![group(string("b")), string("c")]),
    ]);
    let re = Regex::new(&pat);

    let caps = re.captures("ab").unwrap();
    assert_eq!(caps.group_len(), 3);
    assert_eq!(caps.offset(1).map(|s| s.range()), Some(0..1));
    assert_eq!(caps.offset(2).map(|s| s.range()), Some(1..2));

    let caps = re.captures("ac").unwrap();
    assert!(caps.matched(1));
    assert!(!caps.matched(2));
    assert_eq!(caps.get(2), None);
    assert_eq!(caps.start(2), None);
    let all: Vec<Option<(usize, usize)>> = caps
        .iter()
        .map(|sp| sp.map(|sp| (sp.start, sp.end)))
        .collect();
    assert_eq!(all, vec![Some((0, 2)), Some((0, 1)), None]);
}

#[test]
#[should_panic(expected = "no group 2")]
fn indexing_an_unmatched_group_panics() {
    let re = Regex::new(&seq(vec![
        group(string("a")),
        alt(vec![group(string("b")), string("c")]),
    ]));
    let caps = re.captures("ac").unwrap();
    let _ = &caps[2];
}

#[test]
fn named_groups_resolve_by_name() {
    let re = Regex::new(&seq(vec![
        named_group("head", rep1(digit())),
        string("-"),
        named_group("tail", rep1(digit())),
    ]));
    assert_eq!(re.group_count(), 3);
    let names: Vec<(&str, usize)> = re.group_names().collect();
    assert_eq!(names, vec![("head", 1), ("tail", 2)]);

    let caps = re.captures("12-34").unwrap();
    assert_eq!(caps.name("head"), Some(&b"12"[..]));
    assert_eq!(caps.name("tail"), Some(&b"34"[..]));
    assert_eq!(caps.name("nope"), None);
}

#[test]
fn no_group_silently_drops_groups_and_names() {
    let re = Regex::new(&no_group(named_group("x", digit())));
    assert_eq!(re.group_count(), 1);
    assert_eq!(re.group_names().count(), 0);
    // Matching still works, with only group 0 present.
    let caps = re.captures("7").unwrap();
    assert_eq!(caps.group_len(), 1);
}

#[test]
fn nest_forgets_captures_of_previous_iterations() {
    let body = alt(vec![group(string("a")), string("b")]);

    let re = Regex::new(&rep(nest(body.clone())));
    let caps = re.captures("ab").unwrap();
    assert_eq!(&caps[0], b"ab");
    // The last iteration matched 'b', so the nested group was erased.
    assert!(!caps.matched(1));

    // Without nest, the capture from the first iteration survives.
    let re = Regex::new(&rep(body));
    let caps = re.captures("ab").unwrap();
    assert_eq!(caps.get(1), Some(&b"a"[..]));
}

#[test]
fn priority_marks_identify_the_winning_branch() {
    let (pa, ra) = mark(string("a"));
    let (pb, rb) = mark(string("b"));
    let re = Regex::new(&alt(vec![ra, rb]));

    let caps = re.captures("xb").unwrap();
    assert!(caps.marked(pb));
    assert!(!caps.marked(pa));
    assert_eq!(caps.pmarks().len(), 1);

    let caps = re.captures("a").unwrap();
    assert!(caps.marked(pa));
    assert!(!caps.marked(pb));
}

#[test]
fn word_boundaries_respect_letters_around() {
    let re = Regex::new(&word(string("at")));
    assert_eq!(span(&re, "at bat"), Some((0, 2)));
    assert_eq!(span(&re, "bat at"), Some((4, 6)));
    assert!(!re.is_match("batter"));
    // Latin-1 letters count as word bytes: 'é' before 'at' means the
    // boundary check fails.
    assert!(!re.is_match(&b"\xE9at"[..]));
    assert!(re.is_match(&b" at"[..]));
}

#[test]
fn whole_string_requires_both_ends() {
    let re = Regex::new(&whole_string(string("abc")));
    assert!(re.is_match("abc"));
    assert!(!re.is_match("abcx"));
    assert!(!re.is_match("xabc"));
}

#[test]
fn anchored_mismatch_fails_fast() {
    let re = Regex::new(&seq(vec![bos(), string("abc")]));
    assert!(re.is_match("abcyy"));
    assert!(!re.is_match("xabc"));
}

#[test]
fn start_anchor_tracks_the_search_span() {
    let re = Regex::new(&seq(vec![start(), string("b")]));
    assert!(!re.is_match("ab"));
    assert!(re.is_match(Input::new("ab").span(1..2)));
}

#[test]
fn searching_a_sub_span_keeps_outer_context() {
    // Within the span, "at" is preceded by a letter, so the word
    // boundary must not match even though the span starts right at 'a'.
    let re = Regex::new(&word(string("at")));
    assert!(!re.is_match(Input::new("bat").span(1..3)));
    assert!(re.is_match(Input::new(" at").span(1..3)));
}

#[test]
fn builder_applies_configuration() {
    let re = Builder::new().case_insensitive(true).build(&string("abc"));
    assert!(re.is_match("AbC"));

    let re = Builder::new()
        .match_kind(MatchKind::Longest)
        .build(&alt(vec![string("foo"), string("foobar")]));
    assert_eq!(span(&re, "foobar"), Some((0, 6)));

    let re = Builder::new()
        .ungreedy(true)
        .build(&seq(vec![string("a"), rep(regex_comb::any())]));
    assert_eq!(span(&re, "axxx"), Some((0, 1)));
}

#[test]
fn matching_is_deterministic_across_runs() {
    let re = Regex::new(&rep1(digit()));
    let first = span(&re, "ab123cd45");
    for _ in 0..5 {
        assert_eq!(span(&re, "ab123cd45"), first);
    }
    // A fresh regex (cold cache) agrees with the warmed-up one.
    let cold = Regex::new(&rep1(digit()));
    assert_eq!(span(&cold, "ab123cd45"), first);
}

#[test]
fn clones_share_nothing_but_agree() {
    let re = Regex::new(&rep1(digit()));
    assert_eq!(span(&re, "a12"), Some((1, 3)));
    let clone = re.clone();
    assert_eq!(span(&clone, "a12"), Some((1, 3)));
    assert_eq!(span(&re, "a12"), Some((1, 3)));
}

#[test]
fn witness_strings_match_their_pattern() {
    let patterns = vec![
        string("abc"),
        seq(vec![string("a"), rep(byte(b'b')), string("c")]),
        alt(vec![string("foo"), string("bar")]),
        rep1(digit()),
        no_case(string("Mix")),
        word(string("w")),
    ];
    for pat in patterns {
        let w = regex_comb::witness(&pat);
        let re = Regex::new(&pat);
        assert!(
            re.is_match(&w[..]),
            "witness {:?} of {:?} does not match",
            w,
            pat,
        );
    }
}
