//! Error types for every stage of the pipeline.
//!
//! Each fallible stage gets its own `thiserror`-derived enum, in the shape of
//! dandy's `grammar::parse::GrammarParseError`: one variant per distinct
//! failure, carrying just enough context (name, position) to build a
//! diagnostic without the caller having to re-parse the message string.

use thiserror::Error;

/// A regex pattern could not be parsed (C1, build time).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegexError {
    #[error("unexpected end of pattern")]
    UnexpectedEnd,
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated character class starting at offset {0}")]
    UnterminatedClass(usize),
    #[error("negated character classes are not supported")]
    NegatedClass,
    #[error("empty character class")]
    EmptyClass,
    #[error("unterminated group starting at offset {0}")]
    UnterminatedGroup(usize),
    #[error("dangling escape at end of pattern")]
    DanglingEscape,
}

/// A lexer/grammar rule file could not be parsed (C9, build time).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleParseError {
    #[error("malformed lexer rule on line {line}: {text:?}")]
    MalformedLexerRule { line: usize, text: String },
    #[error("malformed production on line {line}: {text:?}")]
    MalformedProduction { line: usize, text: String },
    #[error("empty grammar: no productions found")]
    EmptyGrammar,
}

/// The grammar is malformed, or fails the LL(1) disjointness check (C4, build time).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    /// A bare (nonterminal-syntax) symbol appears on some right-hand side
    /// but has no production of its own anywhere in the grammar.
    #[error("'{0}' is used as a nonterminal but has no production of its own")]
    UnknownSymbol(String),
    #[error("the start symbol '{0}' has no productions")]
    StartNotDefined(String),
    #[error(
        "LL(1) conflict for nonterminal '{nonterminal}': productions {prod_a:?} and {prod_b:?} \
         share SELECT tokens {conflict:?}"
    )]
    Ll1Conflict { nonterminal: String, prod_a: String, prod_b: String, conflict: Vec<String> },
}

/// A source program contains a character no token rule can longest-match (C3, compile time).
#[derive(Debug, Error, PartialEq, Eq)]
#[error("lexical error at line {line}, column {column}: unexpected character '{ch}'")]
pub struct LexError {
    pub ch: char,
    pub line: usize,
    pub column: usize,
}

/// A token stream did not match any SELECT-chosen production (C5, compile time).
#[derive(Debug, Error, PartialEq, Eq)]
#[error("syntax error at line {line}, column {column}: expected one of {expected:?}, found '{found}' ({found_lexeme:?})")]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub expected: Vec<String>,
    pub found: String,
    pub found_lexeme: String,
}

/// A single undeclared-identifier use (C6, compile time). Accumulated, not raised immediately.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("semantic error at line {line}, column {column}: '{name}' is undeclared{}",
    match suggestion { Some(s) => format!(" (did you mean '{s}'?)"), None => String::new() })]
pub struct SemanticError {
    pub name: String,
    pub line: usize,
    pub column: usize,
    pub suggestion: Option<String>,
    pub declared: Vec<String>,
}

/// Aggregate error for `generate_compiler` (build time).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Rules(#[from] RuleParseError),
    #[error(transparent)]
    Regex(#[from] RegexError),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Aggregate error for `compile` (compile time).
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lexical(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("{} semantic error(s)", .0.len())]
    Semantic(Vec<SemanticError>),
}
