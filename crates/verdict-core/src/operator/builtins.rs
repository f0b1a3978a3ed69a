//! Built-in operators
//!
//! Identity and membership operators score 0 or 1. The four numeric
//! comparisons use an exponential gradient so near-misses remain gradable:
//! with `shortfall` measuring how far the comparison missed, the score is
//! `exp(-max(0, shortfall) / 250)`. A satisfied comparison has non-positive
//! shortfall and scores exactly 1; missing by 250 scores `exp(-1)`. Strict
//! variants add a small epsilon to the shortfall so equal operands never
//! reach exactly 1.

use super::Operator;
use crate::types::Value;

/// Gradient denominator: the shortfall at which a failed comparison scores `exp(-1)`
pub const GRADIENT_SCALE: f64 = 250.0;

/// Epsilon added to the shortfall of strict comparisons
pub const STRICT_EPSILON: f64 = 1e-6;

fn gradient(shortfall: f64) -> f64 {
    (-shortfall.max(0.0) / GRADIENT_SCALE).exp()
}

fn is_numeric(value: &Value) -> bool {
    value.as_number().is_some()
}

fn numeric_pair(lhs: &Value, rhs: &Value) -> Option<(f64, f64)> {
    Some((lhs.as_number()?, rhs.as_number()?))
}

fn membership(needle: &Value, haystack: &Value) -> Option<bool> {
    haystack.as_array().map(|items| items.contains(needle))
}

fn bool_score(pass: bool) -> f64 {
    if pass {
        1.0
    } else {
        0.0
    }
}

/// The built-in operator set
pub(crate) fn builtin_operators() -> Vec<Operator> {
    vec![
        Operator::new("equal", |lhs, rhs| bool_score(lhs == rhs)),
        Operator::new("notEqual", |lhs, rhs| bool_score(lhs != rhs)),
        // LHS member of RHS array
        Operator::new("in", |lhs, rhs| {
            bool_score(membership(lhs, rhs).unwrap_or(false))
        }),
        Operator::new("notIn", |lhs, rhs| match membership(lhs, rhs) {
            Some(found) => bool_score(!found),
            None => 0.0,
        }),
        // RHS member of LHS array
        Operator::with_validator(
            "contains",
            |lhs, rhs| bool_score(membership(rhs, lhs).unwrap_or(false)),
            |lhs| lhs.as_array().is_some(),
        ),
        Operator::with_validator(
            "doesNotContain",
            |lhs, rhs| bool_score(!membership(rhs, lhs).unwrap_or(true)),
            |lhs| lhs.as_array().is_some(),
        ),
        Operator::with_validator(
            "lessThan",
            |lhs, rhs| match numeric_pair(lhs, rhs) {
                Some((l, r)) => gradient(l - r + STRICT_EPSILON),
                None => 0.0,
            },
            is_numeric,
        ),
        Operator::with_validator(
            "lessThanInclusive",
            |lhs, rhs| match numeric_pair(lhs, rhs) {
                Some((l, r)) => gradient(l - r),
                None => 0.0,
            },
            is_numeric,
        ),
        Operator::with_validator(
            "greaterThan",
            |lhs, rhs| match numeric_pair(lhs, rhs) {
                Some((l, r)) => gradient(r - l + STRICT_EPSILON),
                None => 0.0,
            },
            is_numeric,
        ),
        Operator::with_validator(
            "greaterThanInclusive",
            |lhs, rhs| match numeric_pair(lhs, rhs) {
                Some((l, r)) => gradient(r - l),
                None => 0.0,
            },
            is_numeric,
        ),
    ]
}
