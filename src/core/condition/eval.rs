//! Evaluation of parsed conditions against a metrics snapshot.

use std::collections::BTreeMap;

use super::ast::{CompareOp, Expr};
use super::variables::VariableRegistry;
use super::EvaluationError;
use crate::core::metrics::{MetricValue, MetricsSnapshot};

type Bindings = BTreeMap<String, MetricValue>;

/// Evaluate `expr` to a boolean.
///
/// Every referenced variable is bound before any operator runs, so an unknown
/// variable fails the condition even when it sits in a branch that would not
/// change the result. Both sides of AND/OR are always evaluated for the same
/// reason.
pub(crate) fn evaluate(
    expr: &Expr,
    context: &MetricsSnapshot,
    registry: &VariableRegistry,
) -> Result<bool, EvaluationError> {
    let bindings = bind(expr, context, registry)?;
    eval_bool(expr, &bindings)
}

fn bind(
    expr: &Expr,
    context: &MetricsSnapshot,
    registry: &VariableRegistry,
) -> Result<Bindings, EvaluationError> {
    let mut bindings = Bindings::new();

    for name in expr.variables() {
        let value = match context.get(&name) {
            Some(value) => value.clone(),
            None => match registry.get(&name) {
                Some(spec) => match &spec.fallback {
                    Some(fallback) => {
                        log::warn!(
                            "Variable '{}' missing from metrics, using declared fallback {}",
                            name,
                            fallback
                        );
                        fallback.clone()
                    }
                    None => return Err(EvaluationError::MissingVariable(name)),
                },
                None => return Err(EvaluationError::UnknownVariable(name)),
            },
        };
        bindings.insert(name, value);
    }

    Ok(bindings)
}

fn eval_bool(expr: &Expr, bindings: &Bindings) -> Result<bool, EvaluationError> {
    match expr {
        Expr::And(left, right) => {
            let l = eval_bool(left, bindings)?;
            let r = eval_bool(right, bindings)?;
            Ok(l && r)
        }
        Expr::Or(left, right) => {
            let l = eval_bool(left, bindings)?;
            let r = eval_bool(right, bindings)?;
            Ok(l || r)
        }
        Expr::Not(inner) => Ok(!eval_bool(inner, bindings)?),
        Expr::Comparison { left, op, right } => {
            let l = eval_value(left, bindings)?;
            let r = eval_value(right, bindings)?;
            compare(&l, *op, &r)
        }
        Expr::Literal(_) | Expr::VariableRef(_) => match eval_value(expr, bindings)? {
            MetricValue::Bool(b) => Ok(b),
            other => Err(EvaluationError::NotBoolean(other.kind())),
        },
    }
}

fn eval_value(expr: &Expr, bindings: &Bindings) -> Result<MetricValue, EvaluationError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::VariableRef(name) => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EvaluationError::UnknownVariable(name.clone())),
        _ => eval_bool(expr, bindings).map(MetricValue::Bool),
    }
}

fn compare(left: &MetricValue, op: CompareOp, right: &MetricValue) -> Result<bool, EvaluationError> {
    match (left, right) {
        (MetricValue::Number(l), MetricValue::Number(r)) => Ok(match op {
            CompareOp::Gt => l > r,
            CompareOp::Ge => l >= r,
            CompareOp::Lt => l < r,
            CompareOp::Le => l <= r,
            CompareOp::Eq => l == r,
            CompareOp::Ne => l != r,
        }),
        (MetricValue::Text(l), MetricValue::Text(r)) if op.is_equality() => {
            Ok((l == r) == (op == CompareOp::Eq))
        }
        (MetricValue::Bool(l), MetricValue::Bool(r)) if op.is_equality() => {
            Ok((l == r) == (op == CompareOp::Eq))
        }
        _ => Err(EvaluationError::TypeMismatch {
            left: left.kind(),
            op,
            right: right.kind(),
        }),
    }
}
