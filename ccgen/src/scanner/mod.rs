//! Longest-match scanner runtime (C3).
//!
//! Grounded in `examples/original_source/src/compiler_generator/lexer_generator.py`'s
//! `tokenize` loop (skip whitespace, skip `//` comments, track line/column,
//! emit one trailing `EOF`), but driving the DFA built in [`crate::dfa`]
//! instead of Python's `re` engine.

use crate::dfa::Dfa;
use crate::error::LexError;
use crate::token::Token;

pub fn tokenize(dfa: &Dfa, text: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    let mut line = 1usize;
    let mut column = 1usize;
    let bytes = text.as_bytes();

    while pos < text.len() {
        let ch = text[pos..].chars().next().unwrap();

        if ch.is_whitespace() {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
            pos += ch.len_utf8();
            continue;
        }

        if ch == '/' && bytes.get(pos + 1) == Some(&b'/') {
            match text[pos..].find('\n') {
                Some(rel) => pos += rel,
                None => pos = text.len(),
            }
            continue;
        }

        match dfa.longest_match(&text[pos..]) {
            Some((len, token_type)) => {
                let lexeme = &text[pos..pos + len];
                tokens.push(Token::new(token_type, lexeme, line, column));

                if let Some(last_nl) = lexeme.rfind('\n') {
                    line += lexeme.matches('\n').count();
                    column = lexeme[last_nl + 1..].chars().count() + 1;
                } else {
                    column += lexeme.chars().count();
                }
                pos += len;
            }
            None => return Err(LexError { ch, line, column }),
        }
    }

    tokens.push(Token::eof(line, column));
    Ok(tokens)
}
