//! Thompson construction from regex ASTs to an NFA with priority-tagged
//! accepting states (C1).
//!
//! States live in a flat arena (`Vec<NfaState>`) indexed by `usize`; there
//! are no ownership cycles to track even though `Star` introduces cycles in
//! the transition graph, following the usual "arena of state records indexed by
//! integer" guidance.

use std::collections::{HashSet, BTreeSet};
use crate::regex::Regex;

/// Priority = position of the token rule in the input list; lower is stronger.
pub type Priority = usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NfaState {
    pub transitions: Vec<(char, usize)>,
    pub epsilon: Vec<usize>,
    pub accept: Option<(String, Priority)>,
}

impl NfaState {
    fn new() -> Self {
        NfaState { transitions: Vec::new(), epsilon: Vec::new(), accept: None }
    }
}

/// A Thompson fragment: single start state, set of accepting states.
struct Fragment {
    start: usize,
    accepts: Vec<usize>,
}

/// The combined NFA for every token rule, before subset construction.
#[derive(Clone, Debug)]
pub struct Nfa {
    pub states: Vec<NfaState>,
    pub start: usize,
}

impl Nfa {
    /// Builds one NFA fragment per rule (in priority order) and joins them
    /// under a single global start state with ε-edges, tagging every
    /// fragment's accepting states with `(token_type, priority = rule index)`.
    pub fn from_rules(rules: &[(String, Regex)]) -> Nfa {
        let mut states = Vec::new();
        let global_start = push(&mut states);

        for (priority, (token_type, regex)) in rules.iter().enumerate() {
            let frag = build_fragment(regex, &mut states);
            states[global_start].epsilon.push(frag.start);
            for accept in frag.accepts {
                states[accept].accept = Some((token_type.clone(), priority));
            }
        }

        Nfa { states, start: global_start }
    }

    /// Transitive closure of a state set under ε-edges.
    pub fn epsilon_closure(&self, seed: &[usize]) -> BTreeSet<usize> {
        let mut closure: BTreeSet<usize> = seed.iter().copied().collect();
        let mut stack: Vec<usize> = seed.to_vec();
        while let Some(s) = stack.pop() {
            for &next in &self.states[s].epsilon {
                if closure.insert(next) {
                    stack.push(next);
                }
            }
        }
        closure
    }

    /// The set of states reachable from `set` on input `c` (before closure).
    pub fn mv(&self, set: &BTreeSet<usize>, c: char) -> HashSet<usize> {
        let mut out = HashSet::new();
        for &s in set {
            for &(sym, target) in &self.states[s].transitions {
                if sym == c {
                    out.insert(target);
                }
            }
        }
        out
    }

    /// Every character that appears on a non-ε edge anywhere in the automaton.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.states.iter().flat_map(|s| s.transitions.iter().map(|&(c, _)| c)).collect()
    }
}

fn push(states: &mut Vec<NfaState>) -> usize {
    states.push(NfaState::new());
    states.len() - 1
}

fn build_fragment(re: &Regex, states: &mut Vec<NfaState>) -> Fragment {
    match re {
        Regex::Lit(c) => {
            let s0 = push(states);
            let s1 = push(states);
            states[s0].transitions.push((*c, s1));
            Fragment { start: s0, accepts: vec![s1] }
        }
        Regex::Eps => {
            let s = push(states);
            Fragment { start: s, accepts: vec![s] }
        }
        Regex::Concat(parts) => {
            if parts.is_empty() {
                return build_fragment(&Regex::Eps, states);
            }
            let mut frags = parts.iter().map(|p| build_fragment(p, states));
            let first = frags.next().unwrap();
            let mut accepts = first.accepts;
            let start = first.start;
            for frag in frags {
                for &a in &accepts {
                    states[a].epsilon.push(frag.start);
                }
                accepts = frag.accepts;
            }
            Fragment { start, accepts }
        }
        Regex::Alt(alts) => {
            let new_start = push(states);
            let mut accepts = Vec::new();
            for alt in alts {
                let frag = build_fragment(alt, states);
                states[new_start].epsilon.push(frag.start);
                accepts.extend(frag.accepts);
            }
            Fragment { start: new_start, accepts }
        }
        Regex::Star(inner) => {
            let new_start = push(states);
            let new_accept = push(states);
            let frag = build_fragment(inner, states);
            states[new_start].epsilon.push(frag.start);
            states[new_start].epsilon.push(new_accept);
            for &a in &frag.accepts {
                states[a].epsilon.push(frag.start);
                states[a].epsilon.push(new_accept);
            }
            Fragment { start: new_start, accepts: vec![new_accept] }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_literal_accepts_only_that_char() {
        let nfa = Nfa::from_rules(&[("A".into(), Regex::Lit('a'))]);
        let closure = nfa.epsilon_closure(&[nfa.start]);
        let after_a = nfa.mv(&closure, 'a');
        assert!(after_a.iter().any(|&s| nfa.states[s].accept.is_some()));
    }

    #[test]
    fn priority_is_rule_index() {
        let nfa = Nfa::from_rules(&[
            ("IF".into(), Regex::Lit('a')),
            ("ID".into(), Regex::Lit('a')),
        ]);
        let tags: Vec<_> = nfa.states.iter().filter_map(|s| s.accept.clone()).collect();
        assert_eq!(tags, vec![("IF".to_string(), 0), ("ID".to_string(), 1)]);
    }

    #[test]
    fn star_forms_a_cycle_back_to_its_own_start() {
        let nfa = Nfa::from_rules(&[("A".into(), Regex::Star(Box::new(Regex::Lit('a'))))]);
        let closure = nfa.epsilon_closure(&[nfa.start]);
        assert!(closure.iter().any(|&s| nfa.states[s].accept.is_some()), "empty string accepted by a*");
        let after_a = nfa.epsilon_closure(&nfa.mv(&closure, 'a').into_iter().collect::<Vec<_>>());
        assert!(after_a.iter().any(|&s| nfa.states[s].accept.is_some()));
        let after_aa = nfa.epsilon_closure(&nfa.mv(&after_a, 'a').into_iter().collect::<Vec<_>>());
        assert!(after_aa.iter().any(|&s| nfa.states[s].accept.is_some()));
    }
}
