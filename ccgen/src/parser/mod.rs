//! Predictive parser with syntax-directed translation (C5).
//!
//! Grounded in `examples/original_source/src/compiler_generator/parser_generator.py`'s
//! `parse_symbol`/`match`/`parse` (SELECT-set-driven alternative choice, one
//! AST node per symbol), combined with the structural
//! translation scheme. This supersedes `code_generator.py`'s older
//! name-keyed `_traverse_ast`: TAC is emitted inline as each production
//! reduces, not in a second post-parse walk.

use crate::error::{CompileError, SemanticError, SyntaxError};
use crate::grammar::{Grammar, Symbol};
use crate::semantic::{Suggestion, SymbolTable};
use crate::tac::TacEmitter;
use crate::token::Token;
use std::collections::HashSet;

/// One node of the parse tree. `synthesized` carries the attribute value
/// (a temp name, a label, a lexeme, or a declared variable name) computed
/// by the translation action for this node's production.
#[derive(Clone, Debug)]
pub struct AstNode {
    pub kind: String,
    pub children: Vec<AstNode>,
    pub token: Option<Token>,
    pub synthesized: Option<String>,
}

impl AstNode {
    fn leaf(kind: impl Into<String>, token: Token, value: String) -> Self {
        AstNode { kind: kind.into(), children: Vec::new(), token: Some(token), synthesized: Some(value) }
    }

    fn value(&self) -> String {
        self.synthesized.clone().unwrap_or_default()
    }
}

/// Entry point: parses the whole token stream against `grammar`'s start
/// symbol, consuming children left-to-right and emitting TAC as each
/// production reduces. `require_explicit_declaration` and `write_keywords`
/// come from the grammar-rule file's metadata.
pub fn parse(
    grammar: &Grammar,
    select: &std::collections::HashMap<String, Vec<HashSet<String>>>,
    tokens: &[Token],
    write_keywords: &HashSet<String>,
    require_explicit_declaration: bool,
) -> Result<String, CompileError> {
    let mut ctx = Ctx {
        grammar,
        select,
        tokens,
        pos: 0,
        symtab: SymbolTable::new(),
        emitter: TacEmitter::new(),
        semantic_errors: Vec::new(),
        write_keywords,
        require_explicit_declaration,
    };

    ctx.parse_symbol(&Symbol::Nonterminal(grammar.start.clone()))?;

    let eof = ctx.current();
    if eof.kind != "EOF" {
        return Err(SyntaxError {
            line: eof.line,
            column: eof.column,
            expected: vec!["EOF".to_string()],
            found: eof.kind.clone(),
            found_lexeme: eof.lexeme.clone(),
        }
        .into());
    }

    if !ctx.semantic_errors.is_empty() {
        return Err(CompileError::Semantic(ctx.semantic_errors));
    }

    Ok(ctx.emitter.output())
}

struct Ctx<'a> {
    grammar: &'a Grammar,
    select: &'a std::collections::HashMap<String, Vec<HashSet<String>>>,
    tokens: &'a [Token],
    pos: usize,
    symtab: SymbolTable,
    emitter: TacEmitter,
    semantic_errors: Vec<SemanticError>,
    write_keywords: &'a HashSet<String>,
    require_explicit_declaration: bool,
}

impl<'a> Ctx<'a> {
    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn parse_symbol(&mut self, symbol: &Symbol) -> Result<AstNode, SyntaxError> {
        match symbol {
            Symbol::Terminal(name) => self.expect_terminal(name),
            Symbol::Nonterminal(name) => self.parse_nonterminal(name),
        }
    }

    fn expect_terminal(&mut self, name: &str) -> Result<AstNode, SyntaxError> {
        let tok = self.current().clone();
        if tok.kind != name {
            return Err(self.syntax_error(vec![name.to_string()]));
        }
        self.advance();
        Ok(AstNode::leaf(name, tok.clone(), tok.lexeme.clone()))
    }

    fn syntax_error(&self, mut expected: Vec<String>) -> SyntaxError {
        expected.sort();
        expected.dedup();
        let tok = self.current();
        SyntaxError { line: tok.line, column: tok.column, expected, found: tok.kind.clone(), found_lexeme: tok.lexeme.clone() }
    }

    /// Chooses the unique alternative whose SELECT set contains the current
    /// token type, then dispatches to the translation action for its shape.
    fn parse_nonterminal(&mut self, name: &str) -> Result<AstNode, SyntaxError> {
        let alts = self.grammar.alternatives(name).to_vec();
        let sets = self.select.get(name).cloned().unwrap_or_default();
        let tok_type = self.current().kind.clone();

        let idx = sets.iter().position(|s| s.contains(&tok_type));
        let idx = match idx {
            Some(i) => i,
            None => {
                let expected: Vec<String> = sets.iter().flat_map(|s| s.iter().cloned()).collect();
                return Err(self.syntax_error(expected));
            }
        };
        let alt = &alts[idx];

        self.reduce(name, alt)
    }

    /// Applies the translation scheme for one chosen
    /// alternative, parsing its symbols (in left-to-right reduction order)
    /// at the point each one's action needs them.
    fn reduce(&mut self, name: &str, alt: &[Symbol]) -> Result<AstNode, SyntaxError> {
        match alt {
            // ε
            [] => Ok(AstNode { kind: name.to_string(), children: Vec::new(), token: None, synthesized: Some(String::new()) }),

            // X -> 'ID'   (bare identifier used as a value: triggers the semantic check)
            [Symbol::Terminal(t)] if t == "ID" => {
                let leaf = self.expect_terminal("ID")?;
                self.check_identifier_use(&leaf);
                Ok(AstNode { kind: name.to_string(), children: vec![leaf.clone()], token: None, synthesized: leaf.synthesized })
            }

            // X -> 'NUM'
            [Symbol::Terminal(t)] if t == "NUM" => {
                let leaf = self.expect_terminal("NUM")?;
                Ok(AstNode { kind: name.to_string(), children: vec![leaf.clone()], token: None, synthesized: leaf.synthesized })
            }

            // X -> Y   (single-symbol passthrough, terminal or nonterminal)
            [single] => {
                let child = self.parse_symbol(single)?;
                let v = child.value();
                Ok(AstNode { kind: name.to_string(), children: vec![child], token: None, synthesized: Some(v) })
            }

            // X -> '(' E ')'
            [Symbol::Terminal(l), Symbol::Nonterminal(e), Symbol::Terminal(r)] if l == "(" && r == ")" => {
                let lp = self.expect_terminal("(")?;
                let expr = self.parse_nonterminal(e)?;
                let rp = self.expect_terminal(")")?;
                let v = expr.value();
                Ok(AstNode { kind: name.to_string(), children: vec![lp, expr, rp], token: None, synthesized: Some(v) })
            }

            // X -> 'ID' 'ASSIGN' E ';'
            [Symbol::Terminal(id), Symbol::Terminal(assign), Symbol::Nonterminal(e), Symbol::Terminal(semi)]
                if id == "ID" && assign == "ASSIGN" && semi == ";" =>
            {
                let id_leaf = self.expect_terminal("ID")?;
                let assign_leaf = self.expect_terminal("ASSIGN")?;
                let expr = self.parse_nonterminal(e)?;
                let semi_leaf = self.expect_terminal(";")?;

                let var = id_leaf.value();
                if self.require_explicit_declaration {
                    // Only an explicit declaration production puts a name in
                    // the table; an assignment to an unknown name is itself
                    // an undeclared-identifier error, not a silent auto-declare.
                    if !self.symtab.is_declared(&var) {
                        self.check_identifier_use(&id_leaf);
                    }
                } else {
                    self.symtab.declare(&var);
                }
                self.emitter.emit(format!("{var} = {}", expr.value()));

                Ok(AstNode {
                    kind: name.to_string(),
                    children: vec![id_leaf, assign_leaf, expr, semi_leaf],
                    token: None,
                    synthesized: None,
                })
            }

            // VarDecl -> KW 'ID' ';'   (single-variable declaration; the
            // keyword itself is whatever the grammar names it, recognized by
            // the nonterminal's own name rather than the keyword's, the same
            // way metadata auto-detection spots a declaration nonterminal)
            [Symbol::Terminal(_kw), Symbol::Terminal(id), Symbol::Terminal(semi)]
                if is_var_decl(name) && id == "ID" && semi == ";" =>
            {
                let kw_leaf = self.expect_terminal(_kw)?;
                let id_leaf = self.expect_terminal("ID")?;
                let semi_leaf = self.expect_terminal(";")?;
                self.symtab.declare(&id_leaf.value());
                Ok(AstNode { kind: name.to_string(), children: vec![kw_leaf, id_leaf, semi_leaf], token: None, synthesized: None })
            }

            // X -> 'READ' 'ID' ';'
            [Symbol::Terminal(read), Symbol::Terminal(id), Symbol::Terminal(semi)] if read == "READ" && id == "ID" && semi == ";" => {
                let read_leaf = self.expect_terminal("READ")?;
                let id_leaf = self.expect_terminal("ID")?;
                let semi_leaf = self.expect_terminal(";")?;

                let var = id_leaf.value();
                self.symtab.declare(&var);
                let t = self.emitter.new_temp();
                self.emitter.emit(format!("{t} = call read, 0"));
                self.emitter.emit(format!("{var} = {t}"));

                Ok(AstNode { kind: name.to_string(), children: vec![read_leaf, id_leaf, semi_leaf], token: None, synthesized: None })
            }

            // X -> K '(' E ')' ';'   where K is a configured write-kind keyword
            [Symbol::Terminal(k), Symbol::Terminal(l), Symbol::Nonterminal(e), Symbol::Terminal(r), Symbol::Terminal(semi)]
                if self.write_keywords.contains(k) && l == "(" && r == ")" && semi == ";" =>
            {
                let k_leaf = self.expect_terminal(k)?;
                let lp = self.expect_terminal("(")?;
                let expr = self.parse_nonterminal(e)?;
                let rp = self.expect_terminal(")")?;
                let semi_leaf = self.expect_terminal(";")?;

                self.emitter.emit(format!("param {}", expr.value()));
                self.emitter.emit("call write, 1");

                Ok(AstNode {
                    kind: name.to_string(),
                    children: vec![k_leaf, lp, expr, rp, semi_leaf],
                    token: None,
                    synthesized: None,
                })
            }

            // X -> 'WHILE' '(' C ')' S
            [Symbol::Terminal(kw), Symbol::Terminal(l), Symbol::Nonterminal(c), Symbol::Terminal(r), Symbol::Nonterminal(s)]
                if kw == "WHILE" && l == "(" && r == ")" =>
            {
                let kw_leaf = self.expect_terminal("WHILE")?;
                let lloop = self.emitter.new_label();
                self.emitter.emit(format!("{lloop}:"));

                let lp = self.expect_terminal("(")?;
                let cond = self.parse_nonterminal(c)?;
                let rp = self.expect_terminal(")")?;

                let t = self.emitter.new_temp();
                self.emitter.emit(format!("{t} = not {}", cond.value()));
                let lexit = self.emitter.new_label();
                self.emitter.emit(format!("if {t} goto {lexit}"));

                let body = self.parse_nonterminal(s)?;

                self.emitter.emit(format!("goto {lloop}"));
                self.emitter.emit(format!("{lexit}:"));

                Ok(AstNode { kind: name.to_string(), children: vec![kw_leaf, lp, cond, rp, body], token: None, synthesized: None })
            }

            // X -> 'IF' '(' C ')' S
            [Symbol::Terminal(kw), Symbol::Terminal(l), Symbol::Nonterminal(c), Symbol::Terminal(r), Symbol::Nonterminal(s)]
                if kw == "IF" && l == "(" && r == ")" =>
            {
                let kw_leaf = self.expect_terminal("IF")?;
                let lp = self.expect_terminal("(")?;
                let cond = self.parse_nonterminal(c)?;
                let rp = self.expect_terminal(")")?;

                let t = self.emitter.new_temp();
                self.emitter.emit(format!("{t} = not {}", cond.value()));
                let lexit = self.emitter.new_label();
                self.emitter.emit(format!("if {t} goto {lexit}"));

                let body = self.parse_nonterminal(s)?;
                self.emitter.emit(format!("{lexit}:"));

                Ok(AstNode { kind: name.to_string(), children: vec![kw_leaf, lp, cond, rp, body], token: None, synthesized: None })
            }

            // X -> E op E   (op recognized structurally: nonterminal — terminal — nonterminal)
            [Symbol::Nonterminal(lhs), Symbol::Terminal(op), Symbol::Nonterminal(rhs)] => {
                let left = self.parse_nonterminal(lhs)?;
                let op_leaf = self.expect_terminal(op)?;
                let right = self.parse_nonterminal(rhs)?;

                let t = self.emitter.new_temp();
                self.emitter.emit(format!("{t} = {} {} {}", left.value(), op_leaf.value(), right.value()));

                Ok(AstNode { kind: name.to_string(), children: vec![left, op_leaf, right], token: None, synthesized: Some(t) })
            }

            // Decl -> 'ID' IDListTail   (declaration; no code emitted)
            [Symbol::Terminal(id), Symbol::Nonterminal(tail)] if id == "ID" && is_id_list_tail(tail) => {
                let id_leaf = self.expect_terminal("ID")?;
                self.symtab.declare(&id_leaf.value());
                let names = self.parse_id_list_tail(tail)?;
                for n in &names {
                    self.symtab.declare(n);
                }
                Ok(AstNode { kind: name.to_string(), children: vec![id_leaf], token: None, synthesized: None })
            }

            // X -> A B, B a fold tail (every B alternative opens with a terminal
            // operator and closes with a self-reference, or is ε): fold B
            // left-associatively with A.v as the seed.
            [Symbol::Nonterminal(a), Symbol::Nonterminal(b)] if self.looks_like_fold_tail(b) => {
                let left = self.parse_nonterminal(a)?;
                let (tail_ast, result) = self.parse_tail(b, left.value())?;
                Ok(AstNode { kind: name.to_string(), children: vec![left, tail_ast], token: None, synthesized: Some(result) })
            }

            // X -> A B, B not a fold tail: plain left-to-right sequencing (e.g.
            // a statement followed by the rest of a statement list). Neither
            // child's attribute is consumed by a caller.
            [Symbol::Nonterminal(a), Symbol::Nonterminal(b)] => {
                let left = self.parse_nonterminal(a)?;
                let right = self.parse_nonterminal(b)?;
                let v = if right.value().is_empty() { left.value() } else { right.value() };
                Ok(AstNode { kind: name.to_string(), children: vec![left, right], token: None, synthesized: Some(v) })
            }

            // Fallback: parse every child generically, left to right; carry the
            // last non-empty synthesized value through (keeps the parser total
            // for grammar shapes the scheme above doesn't name).
            _ => {
                let mut children = Vec::new();
                let mut last = String::new();
                for sym in alt {
                    let child = self.parse_symbol(sym)?;
                    if let Some(v) = &child.synthesized {
                        if !v.is_empty() {
                            last = v.clone();
                        }
                    }
                    children.push(child);
                }
                Ok(AstNode { kind: name.to_string(), children, token: None, synthesized: Some(last) })
            }
        }
    }

    /// Parses a `Tail -> op Operand Tail | ε` (or `Tail -> OpGroup`) style
    /// nonterminal, folding left-associatively with `acc` as the inherited
    /// accumulator. Returns the AST fragment plus the final folded value.
    fn parse_tail(&mut self, tail: &str, acc: String) -> Result<(AstNode, String), SyntaxError> {
        let alts = self.grammar.alternatives(tail).to_vec();
        let sets = self.select.get(tail).cloned().unwrap_or_default();
        let tok_type = self.current().kind.clone();

        let idx = sets.iter().position(|s| s.contains(&tok_type));
        let idx = match idx {
            Some(i) => i,
            None => {
                let expected: Vec<String> = sets.iter().flat_map(|s| s.iter().cloned()).collect();
                return Err(self.syntax_error(expected));
            }
        };
        let alt = alts[idx].clone();

        if alt.is_empty() {
            return Ok((AstNode { kind: tail.to_string(), children: Vec::new(), token: None, synthesized: Some(acc.clone()) }, acc));
        }

        // `Tail -> OpGroup` delegation: a single nonterminal, recurse with the same accumulator.
        if let [Symbol::Nonterminal(delegate)] = alt.as_slice() {
            return self.parse_tail(delegate, acc);
        }

        // `Tail -> op Operand Tail`: first symbol is the operator terminal,
        // last is the recursive self-reference, everything between is the operand.
        if alt.len() < 2 {
            return Err(self.syntax_error(vec![tail.to_string()]));
        }
        let Some(Symbol::Terminal(op_name)) = alt.first() else {
            return Err(self.syntax_error(vec![tail.to_string()]));
        };
        let op_leaf = self.expect_terminal(op_name)?;

        let operand_syms = &alt[1..alt.len() - 1];
        let mut operand_children = Vec::new();
        let mut operand_value = String::new();
        for sym in operand_syms {
            let child = self.parse_symbol(sym)?;
            operand_value = child.value();
            operand_children.push(child);
        }

        let t = self.emitter.new_temp();
        self.emitter.emit(format!("{t} = {acc} {} {operand_value}", op_leaf.value()));

        let mut children = vec![op_leaf];
        children.extend(operand_children);
        let (rest_ast, result) = self.parse_tail(tail, t)?;
        children.push(rest_ast);

        Ok((AstNode { kind: tail.to_string(), children, token: None, synthesized: Some(result.clone()) }, result))
    }

    /// Parses a declaration's name-list tail, collecting every further `ID`
    /// lexeme structurally (punctuation terminals are consumed and ignored).
    fn parse_id_list_tail(&mut self, tail: &str) -> Result<Vec<String>, SyntaxError> {
        let alts = self.grammar.alternatives(tail).to_vec();
        let sets = self.select.get(tail).cloned().unwrap_or_default();
        let tok_type = self.current().kind.clone();

        let idx = sets.iter().position(|s| s.contains(&tok_type));
        let idx = match idx {
            Some(i) => i,
            None => {
                let expected: Vec<String> = sets.iter().flat_map(|s| s.iter().cloned()).collect();
                return Err(self.syntax_error(expected));
            }
        };
        let alt = alts[idx].clone();
        if alt.is_empty() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let mut trailing = None;
        for sym in &alt {
            match sym {
                Symbol::Terminal(t) if t == "ID" => names.push(self.expect_terminal("ID")?.value()),
                Symbol::Terminal(t) => {
                    self.expect_terminal(t)?;
                }
                Symbol::Nonterminal(n) if is_id_list_tail(n) => trailing = Some(n.clone()),
                Symbol::Nonterminal(n) => {
                    self.parse_nonterminal(n)?;
                }
            }
        }
        if let Some(n) = trailing {
            names.extend(self.parse_id_list_tail(&n)?);
        }
        Ok(names)
    }

    /// Structural test for "is `b` a fold-tail nonterminal": every
    /// non-empty alternative opens with a terminal (the operator) and
    /// closes with a self-reference (or delegates to a single nonterminal),
    /// and at least one alternative is non-empty. This is what both
    /// immediate-left-recursion elimination's `A_TAIL` and left-factoring's
    /// `X_LF_TAIL_k` produce, and what a hand-written LL(1) grammar already
    /// in tail form looks like: `Tail → op Operand Tail`.
    fn looks_like_fold_tail(&self, b: &str) -> bool {
        let alts = self.grammar.alternatives(b);
        if alts.is_empty() {
            return false;
        }
        let mut saw_operator_form = false;
        for alt in alts {
            match alt.as_slice() {
                [] => {}
                [Symbol::Nonterminal(_)] => {}
                _ => {
                    let starts_with_terminal = matches!(alt.first(), Some(Symbol::Terminal(_)));
                    let ends_with_self = matches!(alt.last(), Some(Symbol::Nonterminal(n)) if n == b);
                    if !starts_with_terminal || !ends_with_self {
                        return false;
                    }
                    saw_operator_form = true;
                }
            }
        }
        saw_operator_form
    }

    fn check_identifier_use(&mut self, leaf: &AstNode) {
        if !self.require_explicit_declaration {
            return;
        }
        let name = leaf.value();
        if self.symtab.is_declared(&name) {
            return;
        }
        let tok = leaf.token.as_ref().expect("ID leaf always carries its token");
        let suggestion = match self.symtab.suggest(&name) {
            Suggestion::Closest(s) => Some(s),
            Suggestion::ListAll(_) => None,
        };
        let declared = self.symtab.declared_names().to_vec();
        self.semantic_errors.push(SemanticError { name, line: tok.line, column: tok.column, suggestion, declared });
    }
}

fn is_id_list_tail(name: &str) -> bool {
    name.contains("IDList") || name.contains("IdList")
}

fn is_var_decl(name: &str) -> bool {
    name == "VarDecl" || name.contains("VarDecl")
}
