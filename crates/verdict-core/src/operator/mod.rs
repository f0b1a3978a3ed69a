//! Operators and decorators
//!
//! An operator scores a left-hand side (a resolved fact) against a
//! right-hand side (a threshold), returning a number in `[0,1]`; a score of
//! exactly 1 means the comparison passed. Decorators wrap operators to lift
//! them over arrays, swap operands or invert the verdict, and compose
//! through `:`-chained names resolved by the [`OperatorRegistry`].

pub mod builtins;
pub mod decorator;
pub mod registry;

pub use decorator::OperatorDecorator;
pub use registry::OperatorRegistry;

use crate::types::Value;
use std::fmt;
use std::sync::Arc;

/// Scoring callback: `(lhs, rhs) -> score`
pub type OperatorFn = Arc<dyn Fn(&Value, &Value) -> f64 + Send + Sync>;

/// Left-hand-side validator: a rejected LHS scores 0 without invoking the
/// evaluator
pub type ValidatorFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A named comparison operator
#[derive(Clone)]
pub struct Operator {
    name: String,
    evaluate: OperatorFn,
    validator: Option<ValidatorFn>,
}

impl Operator {
    /// Create an operator from a scoring callback
    pub fn new<F>(name: impl Into<String>, evaluate: F) -> Self
    where
        F: Fn(&Value, &Value) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            evaluate: Arc::new(evaluate),
            validator: None,
        }
    }

    /// Create an operator that rejects unsuitable left-hand sides
    pub fn with_validator<F, V>(name: impl Into<String>, evaluate: F, validator: V) -> Self
    where
        F: Fn(&Value, &Value) -> f64 + Send + Sync + 'static,
        V: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            evaluate: Arc::new(evaluate),
            validator: Some(Arc::new(validator)),
        }
    }

    pub(crate) fn from_boxed(name: impl Into<String>, evaluate: OperatorFn) -> Self {
        Self {
            name: name.into(),
            evaluate,
            validator: None,
        }
    }

    /// Operator name as registered
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Score `lhs` against `rhs`.
    ///
    /// The result is always in `[0,1]`: a rejected LHS scores 0, and any
    /// non-finite or out-of-range evaluator output is clamped.
    pub fn apply(&self, lhs: &Value, rhs: &Value) -> f64 {
        if let Some(validator) = &self.validator {
            if !validator(lhs) {
                tracing::trace!(operator = %self.name, lhs = ?lhs, "validator rejected LHS");
                return 0.0;
            }
        }
        let score = (self.evaluate)(lhs, rhs);
        if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// The operator as a bare callback with validation and clamping applied,
    /// suitable for decorator wrapping
    pub(crate) fn boxed_evaluator(&self) -> OperatorFn {
        let op = self.clone();
        Arc::new(move |lhs, rhs| op.apply(lhs, rhs))
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("name", &self.name)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}
