//! Grammar transformation and LL(1) analysis (C4).
//!
//! Grounded in `examples/original_source/src/compiler_generator/parser_generator.py`:
//! `_eliminate_left_recursion` / `_check_potential_indirect_recursion` (Paull's
//! algorithm with a reachability guard), `_eliminate_immediate_left_recursion`,
//! `_perform_left_factoring`, `_compute_first_sets`, `_compute_follow_sets`,
//! `_compute_select_set`, `_check_ll1_conflicts` — transcribed into iterative
//! Rust over the owned [`Grammar`] type instead of Python dicts of lists.

use crate::error::GrammarError;
use crate::grammar::{Grammar, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// An element of a FIRST set: either a concrete terminal, or ε.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FirstSym {
    Terminal(String),
    Epsilon,
}

/// FIRST/FOLLOW/SELECT, computed once per [`Grammar`] and reused by every
/// subsequent [`crate::parser`] invocation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisSets {
    pub first: HashMap<String, HashSet<FirstSym>>,
    pub follow: HashMap<String, HashSet<String>>,
    /// Aligned index-for-index with `grammar.alternatives(nonterminal)`.
    pub select: HashMap<String, Vec<HashSet<String>>>,
}

/// Runs the full transformation pipeline, in order, and returns the
/// transformed grammar plus its analysis sets. Fails if the grammar doesn't
/// validate (undefined start symbol or a reference to an undefined
/// nonterminal) or on an unresolvable LL(1) conflict; left-recursion
/// elimination and left-factoring are themselves total.
pub fn transform(mut grammar: Grammar) -> Result<(Grammar, AnalysisSets), GrammarError> {
    grammar.validate()?;

    eliminate_left_recursion(&mut grammar);
    left_factor_to_fixpoint(&mut grammar);

    let first = compute_first(&grammar);
    let follow = compute_follow(&grammar, &first);
    let select = compute_select(&grammar, &first, &follow);

    check_ll1(&grammar, &select)?;

    Ok((grammar, AnalysisSets { first, follow, select }))
}

// ---------------------------------------------------------------------
// Left recursion
// ---------------------------------------------------------------------

fn eliminate_left_recursion(grammar: &mut Grammar) {
    let order = grammar.nonterminals();

    for i in 0..order.len() {
        let ai = &order[i];
        for aj in order.iter().take(i) {
            if reachable_left_corner(grammar, aj, ai) {
                substitute_indirect(grammar, ai, aj);
            }
        }
        eliminate_immediate_left_recursion(grammar, ai);
    }
}

/// Does some production of `start` begin (after zero or more nonterminal
/// left-corner steps) with `target`? Only the first symbol of each
/// production matters, since only the first symbol can induce left
/// recursion.
fn reachable_left_corner(grammar: &Grammar, start: &str, target: &str) -> bool {
    let mut visited = HashSet::new();
    reachable_left_corner_inner(grammar, start, target, &mut visited)
}

fn reachable_left_corner_inner(grammar: &Grammar, start: &str, target: &str, visited: &mut HashSet<String>) -> bool {
    if start == target {
        return true;
    }
    if !visited.insert(start.to_string()) {
        return false;
    }
    for alt in grammar.alternatives(start) {
        let Some(first) = alt.first() else { continue };
        if let Symbol::Nonterminal(next) = first {
            if reachable_left_corner_inner(grammar, next, target, visited) {
                return true;
            }
        }
    }
    false
}

/// For `Ai -> Aj gamma`, substitutes every `Aj`-alternative `beta` in,
/// producing `Ai -> beta gamma`. Only applied when [`reachable_left_corner`]
/// says the substitution is necessary, so grammar shape is preserved
/// wherever it would be harmless.
fn substitute_indirect(grammar: &mut Grammar, ai: &str, aj: &str) {
    let current = grammar.alternatives(ai).to_vec();
    let aj_alts = grammar.alternatives(aj).to_vec();

    let mut rewritten = Vec::new();
    for alt in current {
        match alt.first() {
            Some(Symbol::Nonterminal(name)) if name == aj => {
                let gamma = &alt[1..];
                for beta in &aj_alts {
                    let mut new_alt = beta.clone();
                    new_alt.extend_from_slice(gamma);
                    rewritten.push(new_alt);
                }
            }
            _ => rewritten.push(alt),
        }
    }
    grammar.set_alternatives(ai, rewritten);
}

fn eliminate_immediate_left_recursion(grammar: &mut Grammar, a: &str) {
    let productions = grammar.alternatives(a).to_vec();
    let mut alphas = Vec::new();
    let mut betas = Vec::new();
    for prod in productions {
        match prod.first() {
            Some(Symbol::Nonterminal(name)) if name == a => alphas.push(prod[1..].to_vec()),
            _ => betas.push(prod),
        }
    }

    if alphas.is_empty() {
        return;
    }

    let tail = format!("{a}_TAIL");
    let mut tail_alts: Vec<Vec<Symbol>> = alphas
        .into_iter()
        .map(|mut alpha| {
            alpha.push(Symbol::Nonterminal(tail.clone()));
            alpha
        })
        .collect();
    tail_alts.push(Vec::new()); // ε
    grammar.set_alternatives(&tail, tail_alts);

    if betas.is_empty() {
        log::warn!(
            "nonterminal '{a}' has only left-recursive alternatives; it is unreachable after elimination"
        );
        grammar.set_alternatives(a, Vec::new());
        return;
    }

    let new_a_alts = betas
        .into_iter()
        .map(|mut beta| {
            beta.push(Symbol::Nonterminal(tail.clone()));
            beta
        })
        .collect();
    grammar.set_alternatives(a, new_a_alts);
}

// ---------------------------------------------------------------------
// Left factoring
// ---------------------------------------------------------------------

fn left_factor_to_fixpoint(grammar: &mut Grammar) {
    let bound = 2 * grammar.nonterminals().len().max(1);
    let mut counter = 0usize;

    for _ in 0..bound {
        let mut changed = false;
        let snapshot = grammar.nonterminals();

        for nt in snapshot {
            let alts = grammar.alternatives(&nt).to_vec();
            if alts.len() < 2 {
                continue;
            }

            let mut groups: HashMap<Option<Symbol>, Vec<Vec<Symbol>>> = HashMap::new();
            let mut group_order: Vec<Option<Symbol>> = Vec::new();
            for alt in alts {
                let key = alt.first().cloned();
                if !groups.contains_key(&key) {
                    group_order.push(key.clone());
                }
                groups.entry(key).or_default().push(alt);
            }

            let mut rebuilt = Vec::new();
            for key in group_order {
                let group = groups.remove(&key).unwrap();
                if group.len() < 2 {
                    rebuilt.extend(group);
                    continue;
                }

                let min_len = group.iter().map(|p| p.len()).min().unwrap();
                let mut prefix_len = 0;
                while prefix_len < min_len && group.iter().all(|p| p[prefix_len] == group[0][prefix_len]) {
                    prefix_len += 1;
                }

                if prefix_len == 0 {
                    rebuilt.extend(group);
                    continue;
                }

                let prefix = group[0][..prefix_len].to_vec();
                let new_nt = format!("{nt}_LF_TAIL_{counter}");
                counter += 1;
                let tails: Vec<Vec<Symbol>> = group.into_iter().map(|p| p[prefix_len..].to_vec()).collect();
                grammar.set_alternatives(&new_nt, tails);

                let mut new_alt = prefix;
                new_alt.push(Symbol::Nonterminal(new_nt));
                rebuilt.push(new_alt);
                changed = true;
            }

            grammar.set_alternatives(&nt, rebuilt);
        }

        if !changed {
            break;
        }
    }
}

// ---------------------------------------------------------------------
// FIRST / FOLLOW / SELECT
// ---------------------------------------------------------------------

fn first_of_symbol(_grammar: &Grammar, first: &HashMap<String, HashSet<FirstSym>>, sym: &Symbol) -> HashSet<FirstSym> {
    match sym {
        Symbol::Terminal(t) => HashSet::from([FirstSym::Terminal(t.clone())]),
        // `validate` has already guaranteed every nonterminal reference has
        // a production of its own, so this always hits an entry `compute_first`
        // seeded for every nonterminal in the grammar.
        Symbol::Nonterminal(nt) => first.get(nt).cloned().unwrap_or_default(),
    }
}

fn first_of_sequence(grammar: &Grammar, first: &HashMap<String, HashSet<FirstSym>>, seq: &[Symbol]) -> HashSet<FirstSym> {
    let mut out = HashSet::new();
    for sym in seq {
        let f = first_of_symbol(grammar, first, sym);
        let has_eps = f.contains(&FirstSym::Epsilon);
        out.extend(f.into_iter().filter(|s| *s != FirstSym::Epsilon));
        if !has_eps {
            return out;
        }
    }
    out.insert(FirstSym::Epsilon);
    out
}

fn compute_first(grammar: &Grammar) -> HashMap<String, HashSet<FirstSym>> {
    let mut first: HashMap<String, HashSet<FirstSym>> = grammar.nonterminals().into_iter().map(|n| (n, HashSet::new())).collect();

    let mut changed = true;
    while changed {
        changed = false;
        for nt in grammar.nonterminals() {
            for alt in grammar.alternatives(&nt) {
                let before = first[&nt].len();
                let seq_first = first_of_sequence(grammar, &first, alt);
                first.get_mut(&nt).unwrap().extend(seq_first);
                if first[&nt].len() != before {
                    changed = true;
                }
            }
        }
    }
    first
}

fn compute_follow(grammar: &Grammar, first: &HashMap<String, HashSet<FirstSym>>) -> HashMap<String, HashSet<String>> {
    let mut follow: HashMap<String, HashSet<String>> = grammar.nonterminals().into_iter().map(|n| (n, HashSet::new())).collect();
    follow.get_mut(&grammar.start).unwrap().insert("EOF".to_string());

    let mut changed = true;
    while changed {
        changed = false;
        for a in grammar.nonterminals() {
            for alt in grammar.alternatives(&a) {
                for (i, sym) in alt.iter().enumerate() {
                    let Symbol::Nonterminal(b) = sym else { continue };
                    if !grammar.is_nonterminal(b) {
                        continue;
                    }
                    let before = follow[b].len();
                    let beta = &alt[i + 1..];
                    let beta_first = first_of_sequence(grammar, first, beta);
                    let beta_has_eps = beta.is_empty() || beta_first.contains(&FirstSym::Epsilon);
                    for t in beta_first {
                        if let FirstSym::Terminal(t) = t {
                            follow.get_mut(b).unwrap().insert(t);
                        }
                    }
                    if beta_has_eps {
                        let follow_a = follow[&a].clone();
                        follow.get_mut(b).unwrap().extend(follow_a);
                    }
                    if follow[b].len() != before {
                        changed = true;
                    }
                }
            }
        }
    }
    follow
}

fn compute_select(
    grammar: &Grammar,
    first: &HashMap<String, HashSet<FirstSym>>,
    follow: &HashMap<String, HashSet<String>>,
) -> HashMap<String, Vec<HashSet<String>>> {
    let mut select = HashMap::new();
    for nt in grammar.nonterminals() {
        let mut per_alt = Vec::new();
        for alt in grammar.alternatives(&nt) {
            let seq_first = first_of_sequence(grammar, first, alt);
            let has_eps = seq_first.contains(&FirstSym::Epsilon);
            let mut set: HashSet<String> =
                seq_first.into_iter().filter_map(|s| match s { FirstSym::Terminal(t) => Some(t), FirstSym::Epsilon => None }).collect();
            if has_eps {
                set.extend(follow.get(&nt).cloned().unwrap_or_default());
            }
            per_alt.push(set);
        }
        select.insert(nt, per_alt);
    }
    select
}

fn check_ll1(grammar: &Grammar, select: &HashMap<String, Vec<HashSet<String>>>) -> Result<(), GrammarError> {
    for nt in grammar.nonterminals() {
        let alts = grammar.alternatives(&nt);
        let sets = &select[&nt];
        if alts.len() < 2 {
            continue;
        }
        for i in 0..alts.len() {
            for j in (i + 1)..alts.len() {
                let conflict: Vec<String> = sets[i].intersection(&sets[j]).cloned().collect();
                if !conflict.is_empty() {
                    return Err(GrammarError::Ll1Conflict {
                        nonterminal: nt.clone(),
                        prod_a: describe(&alts[i]),
                        prod_b: describe(&alts[j]),
                        conflict,
                    });
                }
            }
        }
    }
    Ok(())
}

fn describe(alt: &[Symbol]) -> String {
    if alt.is_empty() {
        return "ε".to_string();
    }
    alt.iter()
        .map(|s| match s {
            Symbol::Terminal(t) => format!("'{t}'"),
            Symbol::Nonterminal(n) => n.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Symbol::{Nonterminal as NT, Terminal as T};

    fn t(name: &str) -> Symbol {
        T(name.to_string())
    }
    fn nt(name: &str) -> Symbol {
        NT(name.to_string())
    }

    #[test]
    fn eliminates_immediate_left_recursion() {
        // E -> E '+' T | T
        let mut g = Grammar::new("E");
        g.add_production("E", vec![nt("E"), t("PLUS"), nt("T")]);
        g.add_production("E", vec![nt("T")]);
        g.add_production("T", vec![t("NUM")]);

        let (g2, _) = transform(g).unwrap();
        assert!(g2.alternatives("E").iter().all(|alt| alt.first() != Some(&nt("E"))));
        assert!(g2.is_nonterminal("E_TAIL"));
    }

    #[test]
    fn eliminates_indirect_left_recursion() {
        // A -> B 'a' | 'b'
        // B -> A 'c' | 'd'
        let mut g = Grammar::new("A");
        g.add_production("A", vec![nt("B"), t("a")]);
        g.add_production("A", vec![t("b")]);
        g.add_production("B", vec![nt("A"), t("c")]);
        g.add_production("B", vec![t("d")]);

        let (g2, _) = transform(g).unwrap();
        for alt in g2.alternatives("A") {
            assert_ne!(alt.first(), Some(&nt("A")));
        }
    }

    #[test]
    fn left_factors_common_prefixes() {
        // S -> 'if' 'x' | 'if' 'y'
        let mut g = Grammar::new("S");
        g.add_production("S", vec![t("IF"), t("X")]);
        g.add_production("S", vec![t("IF"), t("Y")]);

        let (g2, _) = transform(g).unwrap();
        assert_eq!(g2.alternatives("S").len(), 1);
    }

    #[test]
    fn detects_ll1_conflict() {
        // S -> 'a' | 'a' 'b'   (no common-prefix factoring possible to disjoint SELECT... actually
        // this DOES get left-factored; use a genuine conflict instead: two epsilon-deriving alts)
        let mut g = Grammar::new("S");
        g.add_production("S", vec![nt("A")]);
        g.add_production("S", vec![t("X")]);
        g.add_production("A", vec![t("X")]);

        let err = transform(g).unwrap_err();
        assert!(matches!(err, GrammarError::Ll1Conflict { .. }));
    }

    #[test]
    fn first_follow_select_simple_grammar() {
        // S -> 'a' S | ε
        let mut g = Grammar::new("S");
        g.add_production("S", vec![t("a"), nt("S")]);
        g.add_production("S", vec![]);

        let (g2, sets) = transform(g).unwrap();
        assert!(sets.first["S"].contains(&FirstSym::Terminal("a".to_string())));
        assert!(sets.first["S"].contains(&FirstSym::Epsilon));
        assert!(sets.follow["S"].contains("EOF"));
        let _ = g2;
    }
}
