//! Randomized checks of the engine's universal invariants.

use regex_comb::{
    any, byte, digit, group, rep, rep1, seq, shortest, space, string,
    Chunk, Regex,
};

#[test]
fn split_full_concatenation_is_the_input() {
    fn prop(s: String) -> bool {
        let re = Regex::new(&rep1(space()));
        let mut rebuilt = Vec::new();
        for chunk in re.split_full(&s) {
            match chunk {
                Chunk::Text(text) => rebuilt.extend_from_slice(text),
                Chunk::Delim(caps) => {
                    rebuilt.extend_from_slice(&caps[0])
                }
            }
        }
        rebuilt == s.as_bytes()
    }
    quickcheck::quickcheck(prop as fn(String) -> bool);
}

#[test]
fn replacing_each_match_with_itself_is_identity() {
    fn prop(s: String) -> bool {
        let re = Regex::new(&rep1(digit()));
        let out = re.replace(&s, |caps, dst: &mut Vec<u8>| {
            dst.extend_from_slice(&caps[0])
        });
        out == s.as_bytes()
    }
    quickcheck::quickcheck(prop as fn(String) -> bool);
}

#[test]
fn empty_capable_patterns_emit_boundedly_many_matches() {
    fn prop(s: String) -> bool {
        let re = Regex::new(&rep(byte(b'a')));
        re.find_iter(&s).count() <= s.len() + 1
    }
    quickcheck::quickcheck(prop as fn(String) -> bool);
}

#[test]
fn matching_is_observationally_pure() {
    fn prop(bytes: Vec<u8>) -> bool {
        let pat = seq(vec![rep1(digit()), byte(b'.')]);
        let warm = Regex::new(&pat);
        let first = warm
            .find(&bytes[..])
            .map(|m| (m.start(), m.end()));
        // Re-running on a warm cache and running a cold compile must
        // both reproduce the first answer.
        let again =
            warm.find(&bytes[..]).map(|m| (m.start(), m.end()));
        let cold = Regex::new(&pat)
            .find(&bytes[..])
            .map(|m| (m.start(), m.end()));
        first == again && first == cold
    }
    quickcheck::quickcheck(prop as fn(Vec<u8>) -> bool);
}

#[test]
fn explicit_unanchored_prefix_is_equivalent() {
    fn prop(bytes: Vec<u8>) -> bool {
        let inner = string("ab");
        let implicit = Regex::new(&inner);
        let explicit = Regex::new(&seq(vec![
            shortest(rep(any())),
            group(inner),
        ]));
        let got = implicit
            .find(&bytes[..])
            .map(|m| (m.start(), m.end()));
        let via_group = explicit.captures(&bytes[..]).map(|caps| {
            let sp = caps.offset(1).expect("group 1 must participate");
            (sp.start, sp.end)
        });
        got == via_group
    }
    quickcheck::quickcheck(prop as fn(Vec<u8>) -> bool);
}

#[test]
fn case_insensitive_matches_the_uppercased_needle() {
    fn prop(s: String) -> bool {
        let needle: String = s
            .chars()
            .filter(|c| c.is_ascii_lowercase())
            .take(8)
            .collect();
        let re = Regex::new(&regex_comb::no_case(string(&needle)));
        re.is_match(&needle.to_ascii_uppercase())
            && re.is_match(&needle)
    }
    quickcheck::quickcheck(prop as fn(String) -> bool);
}
