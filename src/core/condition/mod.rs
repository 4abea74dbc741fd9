//! Restricted boolean conditions over a metrics snapshot.
//!
//! Conditions are end-user configuration, so the grammar is deliberately
//! small: the six comparison operators, `AND`, `OR`, `NOT`, parentheses,
//! number/string/boolean literals and case-insensitive variable references.
//! There are no function calls, no indexing and no attribute access.
//!
//! ```
//! use paneld::core::condition::{evaluate, VariableRegistry};
//! use paneld::core::metrics::MetricsSnapshot;
//!
//! let context = MetricsSnapshot::new()
//!     .with("precipitationNow", 0.0)
//!     .with("forecastPrecip2h", 0.5);
//!
//! let active = evaluate(
//!     "precipitationNow > 0 OR forecastPrecip2h >= 0.2",
//!     &context,
//!     &VariableRegistry::new(),
//! )?;
//! assert!(active);
//! # Ok::<(), paneld::core::condition::EvaluationError>(())
//! ```

mod ast;
mod eval;
mod lexer;
mod parser;
mod variables;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use ast::{CompareOp, Expr};
pub use parser::{MAX_CONDITION_LEN, MAX_DEPTH};
pub use variables::{VariableRegistry, VariableSpec};

use crate::core::metrics::MetricsSnapshot;

/// Why a condition could not produce a boolean
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("parse error at offset {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("unsupported operator '{operator}' at offset {position}")]
    UnsupportedOperator { position: usize, operator: String },

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("variable '{0}' was not supplied and has no declared fallback")]
    MissingVariable(String),

    #[error("cannot compare {left} {op} {right}")]
    TypeMismatch {
        left: &'static str,
        op: CompareOp,
        right: &'static str,
    },

    #[error("{0} value used where a boolean is required")]
    NotBoolean(&'static str),
}

impl EvaluationError {
    pub(crate) fn parse<S: Into<String>>(position: usize, message: S) -> Self {
        EvaluationError::Parse {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn unsupported<S: Into<String>>(position: usize, operator: S) -> Self {
        EvaluationError::UnsupportedOperator {
            position,
            operator: operator.into(),
        }
    }

    /// True for errors detected while parsing, before any context is consulted
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            EvaluationError::Parse { .. } | EvaluationError::UnsupportedOperator { .. }
        )
    }
}

/// A parsed condition, ready to be evaluated every cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    pub fn parse(source: &str) -> Result<Self, EvaluationError> {
        let expr = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn evaluate(
        &self,
        context: &MetricsSnapshot,
        registry: &VariableRegistry,
    ) -> Result<bool, EvaluationError> {
        eval::evaluate(&self.expr, context, registry)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Referenced variables (lower-cased, first-seen order)
    pub fn variables(&self) -> Vec<String> {
        self.expr.variables()
    }
}

impl FromStr for Condition {
    type Err = EvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::parse(s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate in one step
pub fn evaluate(
    condition: &str,
    context: &MetricsSnapshot,
    registry: &VariableRegistry,
) -> Result<bool, EvaluationError> {
    Condition::parse(condition)?.evaluate(context, registry)
}
