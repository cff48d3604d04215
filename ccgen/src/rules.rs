//! Lexer-rule file parsing (C9), grounded in
//! `examples/original_source/src/frontend/rule_parser.py`'s
//! `parse_lexer_rules`.
//!
//! ```text
//! # keywords before the identifier rule: order is priority
//! IF = if
//! ID = [a-zA-Z_][a-zA-Z0-9_]*
//! NUM = [0-9]+
//! PLUS = \+
//! ```
//!
//! Blank lines and `#`-prefixed comments are ignored. Order is significant:
//! earlier rules win ties in priority.

use crate::error::RuleParseError;

pub fn lexer_rules(input: &str) -> Result<Vec<(String, String)>, RuleParseError> {
    let mut rules = Vec::new();
    for (lineno, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((name, pattern)) if !name.trim().is_empty() => {
                rules.push((name.trim().to_string(), pattern.trim().to_string()));
            }
            _ => {
                return Err(RuleParseError::MalformedLexerRule { line: lineno + 1, text: raw_line.to_string() })
            }
        }
    }
    Ok(rules)
}
