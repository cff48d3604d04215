//! Context-free grammars (C4's input/output data shape).
//!
//! Mirrors the shape of dandy's `grammar::Grammar`/`grammar::Production`
//! (a nonterminal name plus an ordered list of alternatives), but with owned
//! `String`s rather than borrowed `&str`: [`transform`] fabricates fresh
//! nonterminal names (`_TAIL`, `_LF_TAIL_n`) as it runs, so the grammar must
//! be able to grow without a borrow on the original rule-file text.

pub mod parse;
pub mod transform;

use crate::error::GrammarError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One symbol on the right-hand side of a production.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Terminal(String),
    Nonterminal(String),
}

impl Symbol {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(s) | Symbol::Nonterminal(s) => s,
        }
    }
}

/// All alternatives for a single nonterminal. An empty `Vec<Symbol>`
/// alternative denotes ε.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub name: String,
    pub alternatives: Vec<Vec<Symbol>>,
}

/// A grammar: an ordered list of productions (insertion order is the
/// deterministic order used for error listings) plus a
/// start symbol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grammar {
    pub start: String,
    pub productions: Vec<Production>,
}

impl Grammar {
    pub fn new(start: impl Into<String>) -> Self {
        Grammar { start: start.into(), productions: Vec::new() }
    }

    pub fn add_production(&mut self, nonterminal: &str, alternative: Vec<Symbol>) {
        if let Some(p) = self.productions.iter_mut().find(|p| p.name == nonterminal) {
            p.alternatives.push(alternative);
        } else {
            self.productions.push(Production { name: nonterminal.to_string(), alternatives: vec![alternative] });
        }
    }

    pub fn alternatives(&self, nonterminal: &str) -> &[Vec<Symbol>] {
        self.productions
            .iter()
            .find(|p| p.name == nonterminal)
            .map(|p| p.alternatives.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_alternatives(&mut self, nonterminal: &str, alternatives: Vec<Vec<Symbol>>) {
        if let Some(p) = self.productions.iter_mut().find(|p| p.name == nonterminal) {
            p.alternatives = alternatives;
        } else {
            self.productions.push(Production { name: nonterminal.to_string(), alternatives });
        }
    }

    pub fn nonterminals(&self) -> Vec<String> {
        self.productions.iter().map(|p| p.name.clone()).collect()
    }

    pub fn is_nonterminal(&self, name: &str) -> bool {
        self.productions.iter().any(|p| p.name == name)
    }

    /// Structural well-formedness, checked once right after parsing and
    /// before [`transform`][crate::grammar::transform::transform] touches
    /// the grammar: the start symbol must have productions, and every
    /// nonterminal referenced on a right-hand side must have productions of
    /// its own. Mirrors dandy's `TryFrom<ParsedGrammar>` validation, adapted
    /// to a format where terminal/nonterminal is decided by quoting at parse
    /// time rather than by separate declaration lists.
    pub fn validate(&self) -> Result<(), GrammarError> {
        if !self.is_nonterminal(&self.start) {
            return Err(GrammarError::StartNotDefined(self.start.clone()));
        }
        for p in &self.productions {
            for alt in &p.alternatives {
                for sym in alt {
                    if let Symbol::Nonterminal(name) = sym {
                        if !self.is_nonterminal(name) {
                            return Err(GrammarError::UnknownSymbol(name.clone()));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Every distinct terminal name referenced anywhere in the grammar, plus `EOF`.
    pub fn terminals(&self) -> HashSet<String> {
        let mut out: HashSet<String> = self.productions
            .iter()
            .flat_map(|p| p.alternatives.iter())
            .flat_map(|alt| alt.iter())
            .filter_map(|s| match s {
                Symbol::Terminal(t) => Some(t.clone()),
                Symbol::Nonterminal(_) => None,
            })
            .collect();
        out.insert("EOF".to_string());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_production_groups_alternatives_by_name() {
        let mut g = Grammar::new("S");
        g.add_production("S", vec![Symbol::Nonterminal("A".into())]);
        g.add_production("S", vec![Symbol::Terminal("X".into())]);
        assert_eq!(g.alternatives("S").len(), 2);
    }

    #[test]
    fn terminals_always_includes_eof() {
        let mut g = Grammar::new("S");
        g.add_production("S", vec![Symbol::Terminal("X".into())]);
        let terms = g.terminals();
        assert!(terms.contains("EOF"));
        assert!(terms.contains("X"));
    }

    #[test]
    fn validate_accepts_a_well_formed_grammar() {
        let mut g = Grammar::new("S");
        g.add_production("S", vec![Symbol::Nonterminal("A".into())]);
        g.add_production("A", vec![Symbol::Terminal("X".into())]);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn validate_rejects_undefined_start_symbol() {
        let mut g = Grammar::new("S");
        g.add_production("A", vec![Symbol::Terminal("X".into())]);
        assert_eq!(g.validate(), Err(GrammarError::StartNotDefined("S".into())));
    }

    #[test]
    fn validate_rejects_a_reference_to_an_undefined_nonterminal() {
        let mut g = Grammar::new("S");
        g.add_production("S", vec![Symbol::Nonterminal("Typo".into())]);
        assert_eq!(g.validate(), Err(GrammarError::UnknownSymbol("Typo".into())));
    }
}
