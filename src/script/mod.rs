// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Read-only extraction of literals from embedded page scripts
//!
//! Chat pages sometimes carry data only as literals passed to calls inside
//! `$(function () { ... })` ready-handlers. This module tokenizes and parses a
//! restricted expression grammar into a small tree and reads those literals
//! back out. It never evaluates code.

mod ast;
mod extractor;
mod lexer;
mod parser;
mod value;

pub use ast::{Declarator, Expr, Function, Literal, Property, Stmt, UnaryOp};
pub use extractor::{ScriptExtractor, ROOM_USERS_TARGET};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::parse_program;
pub use value::{object_to_map, FromScriptMap, ScriptMap, ScriptMapExt, ScriptValue};
