// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Recursive-descent parser for embedded page scripts
//!
//! Tolerant by construction: a construct the grammar does not cover is
//! skipped up to the end of its statement and recorded as `Unsupported` or
//! `Expr::Other`, so one odd line does not hide the data-bearing calls that
//! follow it. Only tokenizer failures are errors.

use super::ast::{Declarator, Expr, Function, Literal, Property, Stmt, UnaryOp};
use super::lexer::{tokenize, Token, TokenKind};
use crate::error::Result;

/// Maximum statement and expression nesting before the parser gives up on a statement
const MAX_DEPTH: usize = 128;

const BINARY_OPERATORS: &[&str] = &[
    "||", "&&", "??", "|", "^", "&", "==", "!=", "===", "!==", "<", ">", "<=", ">=", "<<", ">>",
    ">>>", "+", "-", "*", "/", "%", "**",
];

const COMPOUND_ASSIGNMENT: &[&str] = &[
    "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=", "||=",
    "??=",
];

/// Parse script text into a list of top-level statements
pub fn parse_program(source: &str) -> Result<Vec<Stmt>> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens);
    Ok(parser.parse_statements(false))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    // ---- token helpers ----

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.peek().is_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, name: &str) -> bool {
        if self.peek().is_ident(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_opener(tok: &Token) -> bool {
        tok.is_punct("(") || tok.is_punct("[") || tok.is_punct("{")
    }

    fn is_closer(tok: &Token) -> bool {
        tok.is_punct(")") || tok.is_punct("]") || tok.is_punct("}")
    }

    /// Index of the token closing the group opened at `open`
    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (idx, tok) in self.tokens.iter().enumerate().skip(open) {
            if Self::is_opener(tok) {
                depth += 1;
            } else if Self::is_closer(tok) {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            } else if matches!(tok.kind, TokenKind::Eof) {
                return None;
            }
        }
        None
    }

    /// Skip a bracketed group starting at the current opener
    fn skip_group(&mut self) {
        if !Self::is_opener(self.peek()) {
            return;
        }
        match self.matching_close(self.pos) {
            Some(close) => self.pos = close + 1,
            None => self.pos = self.tokens.len() - 1,
        }
    }

    /// Recovery: skip to the end of the current statement.
    /// Consumes a terminating `;`; stops before a closer that belongs to an
    /// enclosing group.
    fn skip_to_statement_end(&mut self) {
        let mut depth = 0usize;
        loop {
            let tok = self.peek().clone();
            if matches!(tok.kind, TokenKind::Eof) {
                return;
            }
            if Self::is_opener(&tok) {
                depth += 1;
            } else if Self::is_closer(&tok) {
                if depth == 0 {
                    return;
                }
                depth -= 1;
                if depth == 0 && tok.is_punct("}") && self.peek_at(1).newline_before {
                    self.advance();
                    return;
                }
            } else if depth == 0 && tok.is_punct(";") {
                self.advance();
                return;
            }
            self.advance();
        }
    }

    /// Statement terminator with automatic semicolon insertion
    fn end_statement(&mut self) -> bool {
        if self.eat_punct(";") {
            return true;
        }
        let tok = self.peek();
        if tok.is_punct("}") || matches!(tok.kind, TokenKind::Eof) || tok.newline_before {
            return true;
        }
        self.skip_to_statement_end();
        false
    }

    // ---- statements ----

    fn parse_statements(&mut self, until_brace: bool) -> Vec<Stmt> {
        let mut out = Vec::new();
        loop {
            let tok = self.peek();
            if matches!(tok.kind, TokenKind::Eof) {
                break;
            }
            if tok.is_punct("}") && until_brace {
                self.advance();
                break;
            }
            if tok.is_punct(";") || (!until_brace && Self::is_closer(tok)) {
                self.advance();
                continue;
            }

            let start = self.pos;
            let stmt = self.parse_statement();
            if self.pos == start {
                self.advance();
            }
            out.push(stmt);
        }
        out
    }

    fn parse_block(&mut self) -> Vec<Stmt> {
        if !self.eat_punct("{") {
            self.skip_to_statement_end();
            return Vec::new();
        }
        self.parse_statements(true)
    }

    fn parse_statement(&mut self) -> Stmt {
        self.depth += 1;
        let stmt = if self.depth > MAX_DEPTH {
            self.skip_to_statement_end();
            Stmt::Unsupported
        } else {
            self.parse_statement_inner()
        };
        self.depth -= 1;
        stmt
    }

    fn parse_statement_inner(&mut self) -> Stmt {
        let tok = self.peek().clone();

        if tok.is_punct("{") {
            return Stmt::Block(self.parse_block());
        }

        let TokenKind::Ident(ref word) = tok.kind else {
            return self.parse_expression_statement();
        };

        match word.as_str() {
            "var" | "const" => self.parse_var(),
            "let" if matches!(self.peek_at(1).kind, TokenKind::Ident(_))
                || self.peek_at(1).is_punct("[")
                || self.peek_at(1).is_punct("{") =>
            {
                self.parse_var()
            }
            "function" => Stmt::Function(self.parse_function()),
            "async" if self.peek_at(1).is_ident("function") && !self.peek_at(1).newline_before => {
                self.advance();
                Stmt::Function(self.parse_function())
            }
            "return" => {
                self.advance();
                let next = self.peek();
                if next.is_punct(";")
                    || next.is_punct("}")
                    || next.newline_before
                    || matches!(next.kind, TokenKind::Eof)
                {
                    self.eat_punct(";");
                    return Stmt::Return(None);
                }
                let expr = self.parse_expression();
                self.end_statement();
                Stmt::Return(Some(expr))
            }
            "if" => {
                self.advance();
                self.skip_group();
                self.parse_nested_statement();
                if self.eat_ident("else") {
                    self.parse_nested_statement();
                }
                Stmt::Unsupported
            }
            "for" | "while" | "with" => {
                self.advance();
                self.eat_ident("await");
                self.skip_group();
                self.parse_nested_statement();
                Stmt::Unsupported
            }
            "do" => {
                self.advance();
                self.parse_nested_statement();
                if self.eat_ident("while") {
                    self.skip_group();
                    self.eat_punct(";");
                }
                Stmt::Unsupported
            }
            "try" => {
                self.advance();
                self.parse_block();
                if self.eat_ident("catch") {
                    self.skip_group();
                    self.parse_block();
                }
                if self.eat_ident("finally") {
                    self.parse_block();
                }
                Stmt::Unsupported
            }
            "switch" | "class" => {
                self.advance();
                while !self.at_eof() && !self.peek().is_punct("{") {
                    self.advance();
                }
                self.skip_group();
                Stmt::Unsupported
            }
            "throw" => {
                self.advance();
                self.parse_expression();
                self.end_statement();
                Stmt::Unsupported
            }
            "break" | "continue" => {
                self.advance();
                if matches!(self.peek().kind, TokenKind::Ident(_)) && !self.peek().newline_before {
                    self.advance();
                }
                self.end_statement();
                Stmt::Unsupported
            }
            "import" | "export" | "debugger" => {
                self.skip_to_statement_end();
                Stmt::Unsupported
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// Body of a control-flow construct; never empty-handed on progress
    fn parse_nested_statement(&mut self) {
        let start = self.pos;
        if !self.eat_punct(";") {
            self.parse_statement();
        }
        if self.pos == start && !self.at_eof() && !self.peek().is_punct("}") {
            self.advance();
        }
    }

    fn parse_expression_statement(&mut self) -> Stmt {
        let expr = self.parse_expression();
        if self.end_statement() {
            Stmt::Expr(expr)
        } else {
            Stmt::Unsupported
        }
    }

    fn parse_var(&mut self) -> Stmt {
        self.advance(); // var / let / const
        let mut declarators = Vec::new();

        loop {
            let name = match self.peek().kind.clone() {
                TokenKind::Ident(name) => {
                    self.advance();
                    Some(name)
                }
                _ if Self::is_opener(self.peek()) => {
                    self.skip_group(); // destructuring pattern
                    None
                }
                _ => {
                    self.skip_to_statement_end();
                    return Stmt::Unsupported;
                }
            };

            let init = if self.eat_punct("=") {
                Some(self.parse_assign())
            } else {
                None
            };

            if let Some(name) = name {
                declarators.push(Declarator { name, init });
            }

            if !self.eat_punct(",") {
                break;
            }
        }

        if self.end_statement() {
            Stmt::Var(declarators)
        } else {
            Stmt::Unsupported
        }
    }

    fn parse_function(&mut self) -> Function {
        self.advance(); // function
        self.eat_punct("*");

        let name = match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Some(name)
            }
            _ => None,
        };

        let params = self.parse_params();
        let body = self.parse_block();
        Function { name, params, body }
    }

    /// Parameter names of a parenthesized list; patterns and defaults are skipped
    fn parse_params(&mut self) -> Vec<String> {
        let mut params = Vec::new();
        if !self.peek().is_punct("(") {
            return params;
        }
        let Some(close) = self.matching_close(self.pos) else {
            self.skip_group();
            return params;
        };

        let mut depth = 0usize;
        let mut expect_name = true;
        for tok in &self.tokens[self.pos + 1..close] {
            if Self::is_opener(tok) {
                depth += 1;
            } else if Self::is_closer(tok) {
                depth = depth.saturating_sub(1);
            } else if depth == 0 {
                match &tok.kind {
                    TokenKind::Ident(name) if expect_name => {
                        params.push(name.clone());
                        expect_name = false;
                    }
                    TokenKind::Punct(",") => expect_name = true,
                    TokenKind::Punct("...") => {}
                    _ => expect_name = false,
                }
                continue;
            }
            expect_name = false;
        }

        self.pos = close + 1;
        params
    }

    // ---- expressions ----

    fn parse_expression(&mut self) -> Expr {
        let first = self.parse_assign();
        if !self.peek().is_punct(",") {
            return first;
        }

        let mut items = vec![first];
        while self.eat_punct(",") {
            items.push(self.parse_assign());
        }
        Expr::Sequence(items)
    }

    fn parse_assign(&mut self) -> Expr {
        self.depth += 1;
        let expr = if self.depth > MAX_DEPTH {
            self.skip_to_statement_end();
            Expr::Other
        } else {
            self.parse_assign_inner()
        };
        self.depth -= 1;
        expr
    }

    fn parse_assign_inner(&mut self) -> Expr {
        if let Some(arrow) = self.try_parse_arrow() {
            return arrow;
        }

        let target = self.parse_conditional();

        if self.eat_punct("=") {
            let value = self.parse_assign();
            return Expr::Assign {
                target: Box::new(target),
                value: Box::new(value),
            };
        }

        if let TokenKind::Punct(op) = self.peek().kind {
            if COMPOUND_ASSIGNMENT.contains(&op) {
                self.advance();
                self.parse_assign();
                return Expr::Other;
            }
        }

        target
    }

    fn try_parse_arrow(&mut self) -> Option<Expr> {
        let offset = usize::from(
            self.peek().is_ident("async")
                && !self.peek_at(1).newline_before
                && !self.peek_at(1).is_punct("=>"),
        );
        let head = self.peek_at(offset).clone();

        let params = match head.kind {
            TokenKind::Ident(ref name) if self.peek_at(offset + 1).is_punct("=>") => {
                self.pos += offset + 1;
                vec![name.clone()]
            }
            TokenKind::Punct("(") => {
                let close = self.matching_close(self.pos + offset)?;
                if !self.tokens.get(close + 1)?.is_punct("=>") {
                    return None;
                }
                self.pos += offset;
                self.parse_params()
            }
            _ => return None,
        };

        self.eat_punct("=>");
        let body = if self.peek().is_punct("{") {
            self.parse_block()
        } else {
            vec![Stmt::Return(Some(self.parse_assign()))]
        };

        Some(Expr::Function(Function {
            name: None,
            params,
            body,
        }))
    }

    fn parse_conditional(&mut self) -> Expr {
        let test = self.parse_binary();
        if !self.eat_punct("?") {
            return test;
        }
        self.parse_assign();
        self.eat_punct(":");
        self.parse_assign();
        Expr::Other
    }

    fn parse_binary(&mut self) -> Expr {
        let mut expr = self.parse_unary();
        loop {
            let is_binary = match &self.peek().kind {
                TokenKind::Punct(op) => BINARY_OPERATORS.contains(op),
                TokenKind::Ident(word) => word == "instanceof" || word == "in",
                _ => false,
            };
            if !is_binary {
                return expr;
            }
            self.advance();
            self.parse_unary();
            expr = Expr::Other;
        }
    }

    fn parse_unary(&mut self) -> Expr {
        self.depth += 1;
        let expr = if self.depth > MAX_DEPTH {
            self.skip_to_statement_end();
            Expr::Other
        } else {
            self.parse_unary_inner()
        };
        self.depth -= 1;
        expr
    }

    fn parse_unary_inner(&mut self) -> Expr {
        let op = match &self.peek().kind {
            TokenKind::Punct("-") => Some(UnaryOp::Neg),
            TokenKind::Punct("+") => Some(UnaryOp::Plus),
            TokenKind::Punct("!") => Some(UnaryOp::Not),
            TokenKind::Punct("~") => Some(UnaryOp::BitNot),
            TokenKind::Ident(w) if w == "typeof" => Some(UnaryOp::TypeOf),
            TokenKind::Ident(w) if w == "void" => Some(UnaryOp::Void),
            TokenKind::Ident(w) if w == "delete" => Some(UnaryOp::Delete),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary();
            return match (op, operand) {
                (UnaryOp::Neg, Expr::Literal(Literal::Number(n))) => {
                    Expr::Literal(Literal::Number(-n))
                }
                (op, operand) => Expr::Unary {
                    op,
                    operand: Box::new(operand),
                },
            };
        }

        if self.peek().is_punct("++") || self.peek().is_punct("--") || self.peek().is_ident("await")
        {
            self.advance();
            self.parse_unary();
            return Expr::Other;
        }

        let expr = self.parse_call_member();
        if (self.peek().is_punct("++") || self.peek().is_punct("--")) && !self.peek().newline_before
        {
            self.advance();
            return Expr::Other;
        }
        expr
    }

    fn parse_call_member(&mut self) -> Expr {
        let mut expr = if self.peek().is_ident("new") {
            self.advance();
            if self.eat_punct(".") {
                self.advance(); // new.target
                Expr::Other
            } else {
                let callee = self.parse_member_only();
                let args = if self.peek().is_punct("(") {
                    self.parse_args()
                } else {
                    Vec::new()
                };
                Expr::New {
                    callee: Box::new(callee),
                    args,
                }
            }
        } else {
            self.parse_primary()
        };

        loop {
            if self.eat_punct(".") {
                expr = self.parse_property_name(expr);
            } else if self.eat_punct("?.") {
                if self.peek().is_punct("(") {
                    let args = self.parse_args();
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                } else if self.peek().is_punct("[") {
                    expr = self.parse_index(expr);
                } else {
                    expr = self.parse_property_name(expr);
                }
            } else if self.peek().is_punct("[") {
                expr = self.parse_index(expr);
            } else if self.peek().is_punct("(") {
                let args = self.parse_args();
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if matches!(self.peek().kind, TokenKind::Template(_)) {
                self.advance(); // tagged template
                expr = Expr::Other;
            } else {
                return expr;
            }
        }
    }

    /// Member chain without calls, for `new` callees
    fn parse_member_only(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            if self.eat_punct(".") {
                expr = self.parse_property_name(expr);
            } else if self.peek().is_punct("[") {
                expr = self.parse_index(expr);
            } else {
                return expr;
            }
        }
    }

    fn parse_property_name(&mut self, object: Expr) -> Expr {
        self.eat_punct("#");
        match self.peek().kind.clone() {
            TokenKind::Ident(property) => {
                self.advance();
                Expr::Member {
                    object: Box::new(object),
                    property,
                }
            }
            _ => Expr::Other,
        }
    }

    fn parse_index(&mut self, object: Expr) -> Expr {
        self.advance(); // [
        let index = self.parse_expression();
        if !self.eat_punct("]") {
            self.skip_to_statement_end();
            self.eat_punct("]");
        }

        match index {
            Expr::Literal(Literal::String(property)) => Expr::Member {
                object: Box::new(object),
                property,
            },
            Expr::Literal(Literal::Number(n)) => Expr::Member {
                object: Box::new(object),
                property: number_key(n),
            },
            index => Expr::Index {
                object: Box::new(object),
                index: Box::new(index),
            },
        }
    }

    fn parse_args(&mut self) -> Vec<Expr> {
        self.advance(); // (
        let mut args = Vec::new();

        loop {
            if self.eat_punct(")") || self.at_eof() {
                return args;
            }
            if self.eat_punct("...") {
                self.parse_assign();
                args.push(Expr::Other);
            } else {
                args.push(self.parse_assign());
            }
            if !self.eat_punct(",") && !self.peek().is_punct(")") {
                self.skip_to_statement_end();
                self.eat_punct(")");
                return args;
            }
        }
    }

    fn parse_primary(&mut self) -> Expr {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Num(n) => {
                self.advance();
                Expr::Literal(Literal::Number(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Expr::Literal(Literal::String(s))
            }
            TokenKind::Template(_) | TokenKind::Regex(_) => {
                self.advance();
                Expr::Other
            }
            TokenKind::Ident(word) => match word.as_str() {
                "true" | "false" => {
                    self.advance();
                    Expr::Literal(Literal::Bool(word == "true"))
                }
                "null" => {
                    self.advance();
                    Expr::Literal(Literal::Null)
                }
                "undefined" => {
                    self.advance();
                    Expr::Literal(Literal::Undefined)
                }
                "function" => Expr::Function(self.parse_function()),
                "async" if self.peek_at(1).is_ident("function") => {
                    self.advance();
                    Expr::Function(self.parse_function())
                }
                "class" => {
                    while !self.at_eof() && !self.peek().is_punct("{") {
                        self.advance();
                    }
                    self.skip_group();
                    Expr::Other
                }
                _ => {
                    self.advance();
                    Expr::Ident(word)
                }
            },
            TokenKind::Punct("(") => {
                self.advance();
                let inner = self.parse_expression();
                if !self.eat_punct(")") {
                    self.skip_to_statement_end();
                    self.eat_punct(")");
                }
                inner
            }
            TokenKind::Punct("[") => self.parse_array(),
            TokenKind::Punct("{") => self.parse_object(),
            TokenKind::Punct(")" | "]" | "}" | ";") => Expr::Other,
            TokenKind::Eof => Expr::Other,
            TokenKind::Punct(_) => {
                self.advance();
                Expr::Other
            }
        }
    }

    fn parse_array(&mut self) -> Expr {
        self.advance(); // [
        let mut items = Vec::new();

        loop {
            if self.eat_punct("]") || self.at_eof() {
                return Expr::Array(items);
            }
            if self.eat_punct(",") {
                items.push(Expr::Literal(Literal::Undefined)); // hole
                continue;
            }
            if self.eat_punct("...") {
                self.parse_assign();
                items.push(Expr::Other);
            } else {
                items.push(self.parse_assign());
            }
            if !self.eat_punct(",") && !self.peek().is_punct("]") {
                self.skip_to_statement_end();
                self.eat_punct("]");
                return Expr::Array(items);
            }
        }
    }

    fn parse_object(&mut self) -> Expr {
        self.advance(); // {
        let mut props = Vec::new();

        loop {
            if self.eat_punct("}") || self.at_eof() {
                return Expr::Object(props);
            }

            if self.eat_punct("...") {
                self.parse_assign();
            } else if let Some(prop) = self.parse_property() {
                props.push(prop);
            }

            if !self.eat_punct(",") && !self.peek().is_punct("}") {
                self.skip_to_statement_end();
                self.eat_punct("}");
                return Expr::Object(props);
            }
        }
    }

    fn parse_property(&mut self) -> Option<Property> {
        let tok = self.advance();
        let (key, shorthand_ok) = match tok.kind {
            TokenKind::Ident(ref name)
                if (name == "get" || name == "set" || name == "async")
                    && !self.peek().is_punct(":")
                    && !self.peek().is_punct("(")
                    && !self.peek().is_punct(",")
                    && !self.peek().is_punct("}") =>
            {
                // Accessor or async method: skip the key and the function
                self.advance();
                self.parse_params();
                self.parse_block();
                return None;
            }
            TokenKind::Ident(name) => (Some(name), true),
            TokenKind::Str(s) => (Some(s), false),
            TokenKind::Num(n) => (Some(number_key(n)), false),
            TokenKind::Punct("[") => {
                self.pos -= 1;
                self.skip_group(); // computed key
                (None, false)
            }
            _ => (None, false),
        };

        let value = if self.eat_punct(":") {
            self.parse_assign()
        } else if self.peek().is_punct("(") {
            let params = self.parse_params();
            let body = self.parse_block();
            Expr::Function(Function {
                name: key.clone(),
                params,
                body,
            })
        } else if shorthand_ok && (self.peek().is_punct(",") || self.peek().is_punct("}")) {
            Expr::Ident(key.clone().unwrap_or_default())
        } else {
            return None;
        };

        key.map(|key| Property { key, value })
    }
}

/// Canonical property key for a numeric literal
fn number_key(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Vec<Stmt> {
        parse_program(src).unwrap()
    }

    fn call_name(stmt: &Stmt) -> Option<String> {
        match stmt {
            Stmt::Expr(expr) => expr.as_named_call().map(|(name, _)| name),
            _ => None,
        }
    }

    #[test]
    fn test_var_declarations() {
        let stmts = parse("var a = 1, b = 'two'; let c; const d = -3.5");
        assert_eq!(stmts.len(), 3);
        let Stmt::Var(decls) = &stmts[0] else {
            panic!("expected var");
        };
        assert_eq!(decls[0].name, "a");
        assert_eq!(decls[0].init, Some(Expr::Literal(Literal::Number(1.0))));
        assert_eq!(decls[1].init, Some(Expr::Literal(Literal::String("two".into()))));

        let Stmt::Var(decls) = &stmts[2] else {
            panic!("expected const");
        };
        assert_eq!(decls[0].init, Some(Expr::Literal(Literal::Number(-3.5))));
    }

    #[test]
    fn test_ready_handler_shape() {
        let stmts = parse(
            r#"$(function () {
                CHAT.Hub.init();
                CHAT.RoomUsers.initPresent([{id: 1, name: ("a")}]);
            });"#,
        );
        assert_eq!(stmts.len(), 1);

        let Stmt::Expr(Expr::Call { callee, args }) = &stmts[0] else {
            panic!("expected call");
        };
        assert_eq!(callee.dotted_name().as_deref(), Some("$"));
        let Expr::Function(func) = &args[0] else {
            panic!("expected function literal");
        };
        assert_eq!(func.body.len(), 2);
        assert_eq!(
            call_name(&func.body[1]).as_deref(),
            Some("CHAT.RoomUsers.initPresent")
        );
    }

    #[test]
    fn test_object_keys() {
        let stmts = parse(r#"x({a: 1, "b-c": true, 3: null, d, e() {}, [k]: 2, ...rest});"#);
        let Stmt::Expr(Expr::Call { args, .. }) = &stmts[0] else {
            panic!("expected call");
        };
        let Expr::Object(props) = &args[0] else {
            panic!("expected object");
        };
        let keys: Vec<_> = props.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b-c", "3", "d", "e"]);
    }

    #[test]
    fn test_arrow_functions() {
        let stmts = parse("$(() => { init(); }); f(x => x + 1); g(async (a, b) => a);");
        assert_eq!(stmts.len(), 3);
        let Stmt::Expr(Expr::Call { args, .. }) = &stmts[0] else {
            panic!("expected call");
        };
        let Expr::Function(func) = &args[0] else {
            panic!("expected arrow");
        };
        assert_eq!(call_name(&func.body[0]).as_deref(), Some("init"));

        let Stmt::Expr(Expr::Call { args, .. }) = &stmts[2] else {
            panic!("expected call");
        };
        let Expr::Function(func) = &args[0] else {
            panic!("expected arrow");
        };
        assert_eq!(func.params, vec!["a", "b"]);
    }

    #[test]
    fn test_recovery_keeps_following_statements() {
        let stmts = parse(
            r#"if (a > b) { weird(); } else x = 1;
               for (var i = 0; i < 3; i++) { loop(); }
               a ?? b @ c;
               last(1);"#,
        );
        assert_eq!(call_name(stmts.last().unwrap()).as_deref(), Some("last"));
    }

    #[test]
    fn test_computed_member_and_new() {
        let stmts = parse(r#"CHAT["RoomUsers"].initPresent([]); var d = new Date(2020, 1);"#);
        assert_eq!(
            call_name(&stmts[0]).as_deref(),
            Some("CHAT.RoomUsers.initPresent")
        );
        let Stmt::Var(decls) = &stmts[1] else {
            panic!("expected var");
        };
        assert!(matches!(decls[0].init, Some(Expr::New { .. })));
    }

    #[test]
    fn test_asi_between_lines() {
        let stmts = parse("a()\nb()\nvar c = 1");
        assert_eq!(stmts.len(), 3);
        assert_eq!(call_name(&stmts[1]).as_deref(), Some("b"));
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let src = format!("x({}1{});", "[".repeat(500), "]".repeat(500));
        let stmts = parse(&src);
        assert!(!stmts.is_empty());
    }

    #[test]
    fn test_deep_blocks_do_not_overflow() {
        let stmts = parse(&"{".repeat(200_000));
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_deep_prefix_chain_does_not_overflow() {
        let stmts = parse(&format!("{}1;", "!".repeat(200_000)));
        assert_eq!(stmts.len(), 1);

        let stmts = parse(&format!("{}x;", "typeof -".repeat(100_000)));
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_deep_if_chain_does_not_overflow() {
        let stmts = parse(&format!("{}x();", "if (1) ".repeat(100_000)));
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_statements_after_deep_block_are_kept() {
        let src = format!("{}{}\nlast(1);", "{".repeat(1_000), "}".repeat(1_000));
        let stmts = parse(&src);
        assert_eq!(call_name(stmts.last().unwrap()).as_deref(), Some("last"));
    }
}
