//! # ccgen
//!
//! `ccgen` turns a pair of rule files — lexical rules and a BNF grammar — into
//! a small compiler: something that takes source text in the language those
//! rules describe and emits three-address code (TAC) for it.
//!
//! ## Usage
//!
//! ```rust
//! use ccgen::pipeline::CompilerSpec;
//!
//! let lexer_rules = "\
//! ID = [a-zA-Z_][a-zA-Z0-9_]*
//! NUM = [0-9]+
//! ASSIGN = =
//! PLUS = \\+
//! ; = ;
//! ";
//! let grammar_rules = "\
//! Program -> 'ID' 'ASSIGN' Expr ';'
//! Expr -> Term ExprTail
//! ExprTail -> 'PLUS' Term ExprTail |
//! Term -> 'ID' | 'NUM'
//! ";
//!
//! let spec = CompilerSpec::generate(lexer_rules, grammar_rules).unwrap();
//! let tac = spec.compile("x = 1 + 2 ;").unwrap();
//! assert_eq!(tac, "t1 = 1 + 2\nx = t1\n");
//! ```
//!
//! ## Pipeline
//!
//! Building a [`pipeline::CompilerSpec`] ([`pipeline::CompilerSpec::generate`])
//! runs once per rule-file pair:
//!
//! 1. [Lexical and grammar rule files are parsed](rules) into regex patterns
//!    and a raw [`grammar::Grammar`].
//! 2. Each pattern is [parsed into a regex AST](regex) and
//!    [compiled to an NFA](nfa), and the rules' NFAs are merged and
//!    [subset-constructed into a DFA](dfa) that longest-matches by priority.
//! 3. The grammar is [transformed](grammar::transform) — left recursion
//!    eliminated, common prefixes left-factored, FIRST/FOLLOW/SELECT sets
//!    computed — and rejected if it isn't LL(1) once transformed.
//!
//! A built [`pipeline::CompilerSpec`] is cheap to reuse
//! ([`pipeline::CompilerSpec::compile`] takes `&self`) and can be serialized
//! with [`pipeline::CompilerSpec::to_bytes`]/[`pipeline::CompilerSpec::from_bytes`]
//! so that generation and compilation can happen in different processes.
//!
//! Compiling a source string then runs per input:
//!
//! 1. The [scanner](scanner) walks the DFA, emitting the longest-match token
//!    at each position (or a [lexical error](error::LexError)).
//! 2. The [parser](parser) drives a SELECT-set-predictive descent over the
//!    token stream, translating each reduced production into TAC as it goes
//!    (or reports a [syntax error](error::SyntaxError)).
//! 3. Identifier uses are checked against a [symbol table](semantic) as they
//!    are reduced, collecting (not short-circuiting on) any
//!    [semantic errors](error::SemanticError), each with a Levenshtein-based
//!    "did you mean" suggestion when one is close enough.
//!
//! See the [`pipeline`] module for the two operations an embedder calls, and
//! the [`grammar::parse`]/[`rules`] modules for the rule-file formats.

pub mod dfa;
pub mod error;
pub mod grammar;
pub mod nfa;
pub mod parser;
pub mod pipeline;
pub mod regex;
pub mod rules;
pub mod scanner;
pub mod semantic;
pub mod tac;
pub mod token;

#[cfg(test)]
mod tests;

pub use pipeline::CompilerSpec;
