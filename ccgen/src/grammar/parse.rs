//! Grammar-rule file parsing (C9), grounded in
//! `examples/original_source/src/frontend/rule_parser.py`'s
//! `parse_grammar_rules` for the file format, and in dandy's
//! `parser::grammar::full_grammar` for the `nom`-combinator style.
//!
//! ```text
//! # @REQUIRE_EXPLICIT_DECLARATION: true
//! Program -> VarDecl Program | Stmt Program |
//! VarDecl -> 'VAR' 'ID' 'SEMI'
//! Stmt -> 'ID' 'ASSIGN' Expr 'SEMI'
//! ```
//!
//! Terminals are quoted (`'NAME'`); nonterminals are bare identifiers; an
//! empty alternative (nothing between `->`/`|` and the next `|`/end of line)
//! denotes ε.

use crate::error::RuleParseError;
use crate::grammar::{Grammar, Symbol};
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till1};
use nom::character::complete::{char as nom_char, space0, space1};
use nom::combinator::verify;
use nom::multi::separated_list0;
use nom::sequence::delimited;
use nom::IResult;
use std::collections::HashMap;

/// Metadata recognized from `# @KEY: VALUE` comments.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Metadata {
    pub require_explicit_declaration: Option<bool>,
    /// Keyword terminal names treated as "write"-kind,
    /// from `# @WRITE_KEYWORDS: NAME1,NAME2` comments. Defaults to `["WRITE"]`.
    pub write_keywords: Vec<String>,
}

const START_CANDIDATES: [&str; 5] = ["Program", "program", "S", "Start", "start"];

pub fn grammar_rules(input: &str) -> Result<(Grammar, Metadata), RuleParseError> {
    let mut metadata = Metadata::default();
    let mut order: Vec<String> = Vec::new();
    let mut alts_by_name: HashMap<String, Vec<Vec<Symbol>>> = HashMap::new();

    for (lineno, raw_line) in input.lines().enumerate() {
        let line_num = lineno + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(meta_text) = line.strip_prefix("# @") {
            parse_metadata_line(meta_text, &mut metadata);
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let (lhs, rhs) = match parse_production_line(line) {
            Ok((_, parsed)) => parsed,
            Err(_) => {
                return Err(RuleParseError::MalformedProduction { line: line_num, text: raw_line.to_string() })
            }
        };

        let entry = alts_by_name.entry(lhs.clone()).or_insert_with(|| {
            order.push(lhs.clone());
            Vec::new()
        });
        entry.extend(rhs);
    }

    if order.is_empty() {
        return Err(RuleParseError::EmptyGrammar);
    }

    let start = START_CANDIDATES
        .iter()
        .find(|cand| order.iter().any(|n| n == *cand))
        .map(|s| s.to_string())
        .unwrap_or_else(|| order[0].clone());

    let mut grammar = Grammar::new(start);
    for name in &order {
        grammar.set_alternatives(name, alts_by_name.remove(name).unwrap_or_default());
    }

    if metadata.require_explicit_declaration.is_none() {
        let auto = order.iter().any(|n| n == "VarDecl" || n == "IDList")
            || grammar.productions.iter().any(|p| {
                p.alternatives.iter().any(|alt| alt.iter().any(|s| s.name() == "VarDecl" || s.name() == "IDList"))
            });
        metadata.require_explicit_declaration = Some(auto);
    }
    if metadata.write_keywords.is_empty() {
        metadata.write_keywords.push("WRITE".to_string());
    }

    Ok((grammar, metadata))
}

fn parse_metadata_line(text: &str, metadata: &mut Metadata) {
    let Some((key, value)) = text.split_once(':') else { return };
    let key = key.trim().to_ascii_lowercase();
    if key == "require_explicit_declaration" {
        let value = value.trim().to_ascii_lowercase();
        metadata.require_explicit_declaration = Some(matches!(value.as_str(), "true" | "1" | "yes"));
    } else if key == "write_keywords" {
        metadata.write_keywords = value.trim().split(',').map(|s| s.trim().to_ascii_uppercase()).filter(|s| !s.is_empty()).collect();
    }
}

fn parse_production_line(input: &str) -> IResult<&str, (String, Vec<Vec<Symbol>>)> {
    let (input, lhs) = symbol_name(input)?;
    let (input, _) = delimited(space0, tag("->"), space0)(input)?;
    let (input, alternatives) = separated_list0(delimited(space0, nom_char('|'), space0), alternative)(input)?;
    Ok((input, (lhs.to_string(), alternatives)))
}

fn alternative(input: &str) -> IResult<&str, Vec<Symbol>> {
    separated_list0(space1, symbol)(input)
}

fn symbol(input: &str) -> IResult<&str, Symbol> {
    alt((
        |i| {
            let (i, name) = delimited(nom_char('\''), take_till1(|c| c == '\''), nom_char('\''))(i)?;
            Ok((i, Symbol::Terminal(name.to_string())))
        },
        |i| {
            let (i, name) = symbol_name(i)?;
            Ok((i, Symbol::Nonterminal(name.to_string())))
        },
    ))(input)
}

fn symbol_name(input: &str) -> IResult<&str, &str> {
    verify(take_till1(|c: char| c.is_whitespace() || c == '|' || c == '\''), |s: &str| s != "->")(input)
}
