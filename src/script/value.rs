// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Literal values lifted out of script expressions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ast::{Expr, Literal, UnaryOp};

/// A literal value found in a script.
///
/// Numbers and strings are distinct: `"1"` never reads as `1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptValue {
    Bool(bool),
    Number(f64),
    String(String),
}

/// String-keyed map of the literal entries of an object literal
pub type ScriptMap = BTreeMap<String, ScriptValue>;

impl ScriptValue {
    /// Evaluate an expression if it is a plain literal.
    ///
    /// Negated and `!`-prefixed numeric literals (`-1`, `!0`) are folded;
    /// `null`, `undefined` and anything non-literal yield `None`.
    pub fn from_expr(expr: &Expr) -> Option<Self> {
        match expr {
            Expr::Literal(Literal::Bool(b)) => Some(ScriptValue::Bool(*b)),
            Expr::Literal(Literal::Number(n)) => Some(ScriptValue::Number(*n)),
            Expr::Literal(Literal::String(s)) => Some(ScriptValue::String(s.clone())),
            Expr::Unary { op, operand } => match (op, Self::from_expr(operand)?) {
                (UnaryOp::Neg, ScriptValue::Number(n)) => Some(ScriptValue::Number(-n)),
                (UnaryOp::Plus, ScriptValue::Number(n)) => Some(ScriptValue::Number(n)),
                (UnaryOp::Not, ScriptValue::Number(n)) => Some(ScriptValue::Bool(n == 0.0)),
                (UnaryOp::Not, ScriptValue::Bool(b)) => Some(ScriptValue::Bool(!b)),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Integral numbers only
    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64()
            .filter(|n| n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15)
            .map(|n| n as i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Build a `ScriptMap` from an object literal, dropping non-literal entries
pub fn object_to_map(expr: &Expr) -> Option<ScriptMap> {
    let Expr::Object(props) = expr else {
        return None;
    };
    Some(
        props
            .iter()
            .filter_map(|p| ScriptValue::from_expr(&p.value).map(|v| (p.key.clone(), v)))
            .collect(),
    )
}

/// Typed records built from a script object literal.
///
/// Implementations map fields one by one: missing or mistyped keys fall back
/// to defaults and unknown keys are ignored.
pub trait FromScriptMap: Sized {
    fn from_script_map(map: &ScriptMap) -> Self;
}

/// Field accessors used by `FromScriptMap` implementations
pub trait ScriptMapExt {
    fn string(&self, key: &str) -> String;
    fn int(&self, key: &str) -> i64;
    fn flag(&self, key: &str) -> bool;
}

impl ScriptMapExt for ScriptMap {
    fn string(&self, key: &str) -> String {
        self.get(key)
            .and_then(ScriptValue::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn int(&self, key: &str) -> i64 {
        self.get(key).and_then(ScriptValue::as_i64).unwrap_or_default()
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(ScriptValue::as_bool).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ast::Property;

    fn lit(l: Literal) -> Expr {
        Expr::Literal(l)
    }

    #[test]
    fn test_literal_evaluation() {
        assert_eq!(
            ScriptValue::from_expr(&lit(Literal::Number(3.0))),
            Some(ScriptValue::Number(3.0))
        );
        assert_eq!(ScriptValue::from_expr(&lit(Literal::Null)), None);
        assert_eq!(ScriptValue::from_expr(&Expr::Ident("x".into())), None);

        let not_zero = Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(lit(Literal::Number(0.0))),
        };
        assert_eq!(ScriptValue::from_expr(&not_zero), Some(ScriptValue::Bool(true)));
    }

    #[test]
    fn test_object_to_map_drops_non_literals() {
        let obj = Expr::Object(vec![
            Property {
                key: "id".into(),
                value: lit(Literal::Number(7.0)),
            },
            Property {
                key: "name".into(),
                value: lit(Literal::String("7".into())),
            },
            Property {
                key: "handler".into(),
                value: Expr::Ident("fn".into()),
            },
        ]);

        let map = object_to_map(&obj).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.int("id"), 7);
        assert_eq!(map.string("name"), "7");
        // numbers and strings stay disjoint
        assert_eq!(map.int("name"), 0);
        assert_eq!(map.string("id"), "");
        assert!(!map.flag("missing"));
    }

    #[test]
    fn test_as_i64_rejects_fractions() {
        assert_eq!(ScriptValue::Number(1.5).as_i64(), None);
        assert_eq!(ScriptValue::Number(-2.0).as_i64(), Some(-2));
    }
}
