// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Data extraction from page ready-handlers

use super::ast::{Expr, Stmt};
use super::parser::parse_program;
use super::value::{object_to_map, FromScriptMap, ScriptMap, ScriptValue};
use crate::error::{Error, Result};
use crate::html::Document;

/// Call that receives the occupants of a room on its page
pub const ROOM_USERS_TARGET: &str = "CHAT.RoomUsers.initPresent";

/// Finds data-bearing calls inside `$(function () { ... })` blocks of a page.
///
/// This is not an interpreter: nothing is executed, and only literal values
/// are read out of the matched call.
#[derive(Debug, Clone)]
pub struct ScriptExtractor {
    ready_handler: String,
}

impl Default for ScriptExtractor {
    fn default() -> Self {
        Self {
            ready_handler: "$".to_string(),
        }
    }
}

impl ScriptExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different ready-handler registration function (e.g. `jQuery`)
    pub fn with_ready_handler(mut self, name: impl Into<String>) -> Self {
        self.ready_handler = name.into();
        self
    }

    /// Parse every inline script of a page; statements are concatenated in
    /// document order. A block that fails to tokenize is skipped.
    pub fn parse_page(&self, html: &str) -> Result<Vec<Stmt>> {
        let scripts = Document::parse(html)?.inline_scripts()?;

        let mut program = Vec::new();
        for (idx, script) in scripts.iter().enumerate() {
            match parse_program(script) {
                Ok(stmts) => program.extend(stmts),
                Err(e) => tracing::debug!(block = idx, error = %e, "skipping unparseable script"),
            }
        }
        Ok(program)
    }

    /// Statements inside all ready-handler function literals, flattened
    pub fn ready_statements<'a>(&self, program: &'a [Stmt]) -> Vec<&'a Stmt> {
        let mut statements = Vec::new();
        for stmt in program {
            let Stmt::Expr(expr) = stmt else {
                continue;
            };
            for expr in flatten_sequence(expr) {
                let Some((name, args)) = expr.as_named_call() else {
                    continue;
                };
                if name != self.ready_handler || args.len() != 1 {
                    continue;
                }
                if let Expr::Function(func) = &args[0] {
                    statements.extend(func.body.iter());
                }
            }
        }
        statements
    }

    /// Arguments of the first call to `target` among the given statements
    pub fn find_call<'a>(&self, statements: &[&'a Stmt], target: &str) -> Option<&'a [Expr]> {
        self.calls(statements, target).next()
    }

    fn calls<'a, 's>(
        &'s self,
        statements: &'s [&'a Stmt],
        target: &'s str,
    ) -> impl Iterator<Item = &'a [Expr]> + 's {
        statements
            .iter()
            .copied()
            .filter_map(|stmt| match stmt {
                Stmt::Expr(expr) => Some(expr),
                _ => None,
            })
            .flat_map(|expr| flatten_sequence(expr))
            .filter_map(move |expr| match expr.as_named_call() {
                Some((name, args)) if name == target => Some(args),
                _ => None,
            })
    }

    /// Object literals passed as the single array argument of `target`
    pub fn extract_records(&self, program: &[Stmt], target: &str) -> Result<Vec<ScriptMap>> {
        let statements = self.ready_statements(program);

        let items = self
            .calls(&statements, target)
            .find_map(|args| match args {
                [Expr::Array(items)] => Some(items),
                _ => None,
            })
            .ok_or_else(|| Error::TargetCallNotFound {
                target: target.to_string(),
            })?;

        Ok(items.iter().filter_map(object_to_map).collect())
    }

    /// Typed records from a page
    pub fn extract<T: FromScriptMap>(&self, html: &str, target: &str) -> Result<Vec<T>> {
        let program = self.parse_page(html)?;
        let records = self.extract_records(&program, target)?;
        tracing::debug!(target_call = target, count = records.len(), "extracted script records");
        Ok(records.iter().map(T::from_script_map).collect())
    }

    /// Top-level `var` declarations as name → literal value (None if not a literal)
    pub fn assignments(&self, program: &[Stmt]) -> Vec<(String, Option<ScriptValue>)> {
        program
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Var(decls) => Some(decls),
                _ => None,
            })
            .flatten()
            .map(|decl| {
                let value = decl.init.as_ref().and_then(ScriptValue::from_expr);
                (decl.name.clone(), value)
            })
            .collect()
    }
}

fn flatten_sequence(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::Sequence(items) => items.iter().collect(),
        other => vec![other],
    }
}
