//! Regular expression AST (C1).
//!
//! A pattern is parsed once into this tagged-variant tree; `+` and `?` are
//! desugared at parse time (`a+ ≡ a a*`, `a? ≡ a | ε`) and character classes
//! desugar to [`Regex::Alt`] over [`Regex::Lit`], so the NFA builder in
//! [`crate::nfa`] only ever has to handle five shapes.

pub mod parse;

/// A parsed, already-desugared regular expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Regex {
    Lit(char),
    Eps,
    Concat(Vec<Regex>),
    Alt(Vec<Regex>),
    Star(Box<Regex>),
}

impl Regex {
    pub fn parse(pattern: &str) -> Result<Regex, crate::error::RegexError> {
        parse::parse_regex(pattern)
    }

    /// `a+ ≡ a a*`
    pub(crate) fn plus(inner: Regex) -> Regex {
        Regex::Concat(vec![inner.clone(), Regex::Star(Box::new(inner))])
    }

    /// `a? ≡ a | ε`
    pub(crate) fn opt(inner: Regex) -> Regex {
        Regex::Alt(vec![inner, Regex::Eps])
    }
}
