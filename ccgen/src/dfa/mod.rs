//! Subset construction: NFA → DFA (C2).

use std::collections::{BTreeSet, HashMap, VecDeque};
use crate::nfa::{Nfa, Priority};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfaState {
    pub nfa_set: BTreeSet<usize>,
    pub transitions: HashMap<char, usize>,
    pub accept: Option<(String, Priority)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dfa {
    pub states: Vec<DfaState>,
    pub start: usize,
}

impl Dfa {
    /// Standard worklist subset construction. Total for any well-formed NFA;
    /// the only failure mode is a malformed regex, which fails earlier at
    /// [`crate::regex::Regex::parse`] time.
    pub fn from_nfa(nfa: &Nfa) -> Dfa {
        let alphabet: Vec<char> = nfa.alphabet().into_iter().collect();

        let mut states: Vec<DfaState> = Vec::new();
        let mut index: HashMap<BTreeSet<usize>, usize> = HashMap::new();
        let mut worklist: VecDeque<usize> = VecDeque::new();

        let start_set = nfa.epsilon_closure(&[nfa.start]);
        let start_id = intern(&mut states, &mut index, start_set, nfa);
        worklist.push_back(start_id);

        while let Some(id) = worklist.pop_front() {
            let subset = states[id].nfa_set.clone();
            for &c in &alphabet {
                let moved = nfa.mv(&subset, c);
                if moved.is_empty() {
                    continue;
                }
                let moved: Vec<usize> = moved.into_iter().collect();
                let closure = nfa.epsilon_closure(&moved);
                let target = if let Some(&existing) = index.get(&closure) {
                    existing
                } else {
                    let new_id = intern(&mut states, &mut index, closure, nfa);
                    worklist.push_back(new_id);
                    new_id
                };
                states[id].transitions.insert(c, target);
            }
        }

        Dfa { states, start: start_id }
    }

    /// Longest-match DFA simulation over `input` starting at byte offset 0 of
    /// the slice. Returns the byte length of the last accepting prefix
    /// reached, and that prefix's token type, or `None` if no non-empty
    /// prefix of `input` is accepted. A token rule that accepts the empty
    /// string (the start state itself is accepting) never produces a
    /// zero-length match here — that would advance the scanner by nothing
    /// and loop forever — so such a rule simply never matches.
    pub fn longest_match(&self, input: &str) -> Option<(usize, &str)> {
        let mut state = self.start;
        let mut last_accept: Option<(usize, &str)> = None;
        let mut consumed = 0usize;

        for c in input.chars() {
            let Some(&next) = self.states[state].transitions.get(&c) else { break };
            state = next;
            consumed += c.len_utf8();
            if let Some((ty, _)) = &self.states[state].accept {
                last_accept = Some((consumed, ty.as_str()));
            }
        }

        last_accept
    }
}

fn intern(
    states: &mut Vec<DfaState>,
    index: &mut HashMap<BTreeSet<usize>, usize>,
    subset: BTreeSet<usize>,
    nfa: &Nfa,
) -> usize {
    let accept = subset
        .iter()
        .filter_map(|&s| nfa.states[s].accept.clone())
        .min_by_key(|(_, priority)| *priority);

    let id = states.len();
    states.push(DfaState { nfa_set: subset.clone(), transitions: HashMap::new(), accept });
    index.insert(subset, id);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::Regex;

    #[test]
    fn subset_construction_is_total_and_deterministic() {
        let nfa = Nfa::from_rules(&[
            ("IF".into(), Regex::parse("if").unwrap()),
            ("ID".into(), Regex::parse("[a-z]+").unwrap()),
        ]);
        let dfa = Dfa::from_nfa(&nfa);
        // every state has at most one transition per char by construction (HashMap)
        for state in &dfa.states {
            assert!(state.transitions.len() <= 26 + 2);
        }
    }

    #[test]
    fn keyword_wins_over_identifier_when_listed_first() {
        let nfa = Nfa::from_rules(&[
            ("IF".into(), Regex::parse("if").unwrap()),
            ("ID".into(), Regex::parse("[a-z]+").unwrap()),
        ]);
        let dfa = Dfa::from_nfa(&nfa);
        assert_eq!(dfa.longest_match("if"), Some((2, "IF")));
        assert_eq!(dfa.longest_match("iffy"), Some((4, "ID")));
    }

    #[test]
    fn longest_match_prefers_longer_over_shorter_rule() {
        let nfa = Nfa::from_rules(&[
            ("ASSIGN".into(), Regex::parse("=").unwrap()),
            ("EQ".into(), Regex::parse("==").unwrap()),
        ]);
        let dfa = Dfa::from_nfa(&nfa);
        assert_eq!(dfa.longest_match("=="), Some((2, "EQ")));
        assert_eq!(dfa.longest_match("=x"), Some((1, "ASSIGN")));
    }

    #[test]
    fn tie_in_length_breaks_by_priority() {
        // Both "==" patterns match length 2; ASSIGN listed first wins the tie.
        let nfa = Nfa::from_rules(&[
            ("ASSIGN".into(), Regex::parse("==").unwrap()),
            ("EQ".into(), Regex::parse("==").unwrap()),
        ]);
        let dfa = Dfa::from_nfa(&nfa);
        assert_eq!(dfa.longest_match("=="), Some((2, "ASSIGN")));
    }

    #[test]
    fn no_match_returns_none() {
        let nfa = Nfa::from_rules(&[("A".into(), Regex::Lit('a'))]);
        let dfa = Dfa::from_nfa(&nfa);
        assert_eq!(dfa.longest_match("b"), None);
    }

    #[test]
    fn nullable_rule_never_yields_a_zero_length_match() {
        // WS = [ \t]* accepts the empty string at the start state itself.
        let nfa = Nfa::from_rules(&[("WS".into(), Regex::Star(Box::new(Regex::Alt(vec![Regex::Lit(' '), Regex::Lit('\t')]))))]);
        let dfa = Dfa::from_nfa(&nfa);
        assert!(dfa.states[dfa.start].accept.is_some(), "start state should be accepting for a nullable rule");
        assert_eq!(dfa.longest_match("x"), None);
        assert_eq!(dfa.longest_match(""), None);
        assert_eq!(dfa.longest_match("  x"), Some((2, "WS")));
    }
}
