//! Operator decorators
//!
//! A decorator transforms an operator it is chained onto: lifting it over
//! arrays on either side, swapping operands, or inverting the verdict. The
//! built-ins preserve the `[0,1]` scoring algebra so decorated chains stay
//! gradable.

use super::OperatorFn;
use crate::types::Value;
use std::fmt;
use std::sync::Arc;

/// Decorator callback: `(lhs, rhs, next) -> score`
pub type DecoratorFn = Arc<dyn Fn(&Value, &Value, &OperatorFn) -> f64 + Send + Sync>;

/// A named operator decorator
#[derive(Clone)]
pub struct OperatorDecorator {
    name: String,
    wrap: DecoratorFn,
}

impl OperatorDecorator {
    /// Create a decorator from a wrapping callback
    pub fn new<F>(name: impl Into<String>, wrap: F) -> Self
    where
        F: Fn(&Value, &Value, &OperatorFn) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            wrap: Arc::new(wrap),
        }
    }

    /// Decorator name as registered
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close over `next`, producing the wrapped evaluator
    pub(crate) fn wrap(&self, next: OperatorFn) -> OperatorFn {
        let wrap = self.wrap.clone();
        Arc::new(move |lhs, rhs| wrap(lhs, rhs, &next))
    }
}

impl fmt::Debug for OperatorDecorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorDecorator")
            .field("name", &self.name)
            .finish()
    }
}

fn mean_over(items: &[Value], score: impl Fn(&Value) -> f64) -> f64 {
    if items.is_empty() {
        return 1.0;
    }
    items.iter().map(score).sum::<f64>() / items.len() as f64
}

fn max_over(items: &[Value], score: impl Fn(&Value) -> f64) -> f64 {
    items.iter().map(score).fold(0.0, f64::max)
}

/// The built-in decorator set
pub(crate) fn builtin_decorators() -> Vec<OperatorDecorator> {
    vec![
        OperatorDecorator::new("everyFact", |lhs, rhs, next| match lhs.as_array() {
            Some(items) => mean_over(items, |item| next(item, rhs)),
            None => 0.0,
        }),
        OperatorDecorator::new("someFact", |lhs, rhs, next| match lhs.as_array() {
            Some(items) => max_over(items, |item| next(item, rhs)),
            None => 0.0,
        }),
        OperatorDecorator::new("everyValue", |lhs, rhs, next| match rhs.as_array() {
            Some(items) => mean_over(items, |item| next(lhs, item)),
            None => 0.0,
        }),
        OperatorDecorator::new("someValue", |lhs, rhs, next| match rhs.as_array() {
            Some(items) => max_over(items, |item| next(lhs, item)),
            None => 0.0,
        }),
        OperatorDecorator::new("swap", |lhs, rhs, next| next(rhs, lhs)),
        OperatorDecorator::new("not", |lhs, rhs, next| {
            if next(lhs, rhs) < 1.0 {
                1.0
            } else {
                0.0
            }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Operator;

    fn equal_evaluator() -> OperatorFn {
        Operator::new("equal", |l, r| if l == r { 1.0 } else { 0.0 }).boxed_evaluator()
    }

    fn find(name: &str) -> OperatorDecorator {
        builtin_decorators()
            .into_iter()
            .find(|d| d.name() == name)
            .unwrap()
    }

    #[test]
    fn test_every_fact_averages_over_lhs() {
        let wrapped = find("everyFact").wrap(equal_evaluator());
        let lhs = Value::Array(vec![
            Value::Number(1.0),
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0),
        ]);
        assert_eq!(wrapped(&lhs, &Value::Number(1.0)), 0.5);
    }

    #[test]
    fn test_every_fact_empty_array_passes() {
        let wrapped = find("everyFact").wrap(equal_evaluator());
        assert_eq!(wrapped(&Value::Array(vec![]), &Value::Number(1.0)), 1.0);
    }

    #[test]
    fn test_every_fact_non_array_fails() {
        let wrapped = find("everyFact").wrap(equal_evaluator());
        assert_eq!(wrapped(&Value::Number(1.0), &Value::Number(1.0)), 0.0);
    }

    #[test]
    fn test_some_fact_takes_best_element() {
        let wrapped = find("someFact").wrap(equal_evaluator());
        let lhs = Value::Array(vec![Value::Number(2.0), Value::Number(1.0)]);
        assert_eq!(wrapped(&lhs, &Value::Number(1.0)), 1.0);
        assert_eq!(wrapped(&Value::Array(vec![]), &Value::Number(1.0)), 0.0);
    }

    #[test]
    fn test_some_value_and_every_value_act_on_rhs() {
        let some = find("someValue").wrap(equal_evaluator());
        let every = find("everyValue").wrap(equal_evaluator());
        let rhs = Value::Array(vec![Value::Number(1.0), Value::Number(9.0)]);

        assert_eq!(some(&Value::Number(9.0), &rhs), 1.0);
        assert_eq!(every(&Value::Number(9.0), &rhs), 0.5);
    }

    #[test]
    fn test_swap_flips_operands() {
        let contains_one =
            Operator::new("containsOne", |l, _| if l.as_array().is_some() { 1.0 } else { 0.0 });
        let wrapped = find("swap").wrap(contains_one.boxed_evaluator());
        assert_eq!(wrapped(&Value::Number(1.0), &Value::Array(vec![])), 1.0);
    }

    #[test]
    fn test_not_is_binary_inversion() {
        let near_pass = Operator::new("nearPass", |_, _| 0.99);
        let wrapped = find("not").wrap(near_pass.boxed_evaluator());
        assert_eq!(wrapped(&Value::Null, &Value::Null), 1.0);

        let pass = Operator::new("pass", |_, _| 1.0);
        let wrapped = find("not").wrap(pass.boxed_evaluator());
        assert_eq!(wrapped(&Value::Null, &Value::Null), 0.0);
    }
}
