// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Expression tree for embedded page scripts

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    String(String),
    Null,
    Undefined,
}

/// Prefix operators kept in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

/// Expressions.
///
/// Only the shapes the extractor inspects are modelled; everything else
/// (binary operators, conditionals, templates, regexes) collapses into `Other`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Ident(String),
    /// `object.property` or `object["property"]`
    Member {
        object: Box<Expr>,
        property: String,
    },
    /// `object[expr]` with a non-literal index
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Array(Vec<Expr>),
    Object(Vec<Property>),
    Function(Function),
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Comma-separated expressions
    Sequence(Vec<Expr>),
    Other,
}

/// An object literal entry
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: Expr,
}

/// Function declaration, literal or arrow function
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    /// `var`/`let`/`const` with declarators in order
    Var(Vec<Declarator>),
    Block(Vec<Stmt>),
    Function(Function),
    Return(Option<Expr>),
    /// Construct the parser skipped over
    Unsupported,
}

/// A single `name = init` declarator
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: String,
    pub init: Option<Expr>,
}

impl Expr {
    /// Dotted name of an identifier or member chain (`CHAT.RoomUsers.initPresent`)
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Ident(name) => Some(name.clone()),
            Expr::Member { object, property } => {
                object.dotted_name().map(|base| format!("{}.{}", base, property))
            }
            _ => None,
        }
    }

    /// The call's callee name and arguments, if this is a call on a named function
    pub fn as_named_call(&self) -> Option<(String, &[Expr])> {
        match self {
            Expr::Call { callee, args } => callee.dotted_name().map(|name| (name, args.as_slice())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_name() {
        let expr = Expr::Member {
            object: Box::new(Expr::Member {
                object: Box::new(Expr::Ident("CHAT".into())),
                property: "RoomUsers".into(),
            }),
            property: "initPresent".into(),
        };
        assert_eq!(expr.dotted_name().as_deref(), Some("CHAT.RoomUsers.initPresent"));

        let call = Expr::Call {
            callee: Box::new(Expr::Call {
                callee: Box::new(Expr::Ident("f".into())),
                args: vec![],
            }),
            args: vec![],
        };
        assert!(call.as_named_call().is_none());
    }
}
