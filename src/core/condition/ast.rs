use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::metrics::MetricValue;

/// Comparison operators accepted in conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }

    /// `==` and `!=` are the only operators defined for text and booleans
    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Parsed condition
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Comparison {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Literal(MetricValue),
    /// Stored lower-cased; lookups are case-insensitive
    VariableRef(String),
}

impl Expr {
    /// Variables referenced anywhere in the expression, first-seen order, no duplicates
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Expr::Comparison { left, right, .. } | Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            Expr::Not(inner) => inner.collect_variables(out),
            Expr::Literal(_) => {}
            Expr::VariableRef(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Comparison { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expr::And(l, r) => write!(f, "({} AND {})", l, r),
            Expr::Or(l, r) => write!(f, "({} OR {})", l, r),
            Expr::Not(inner) => write!(f, "NOT {}", inner),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::VariableRef(name) => f.write_str(name),
        }
    }
}
