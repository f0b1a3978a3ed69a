//! Operator registry and decorator-chain resolution

use super::builtins::builtin_operators;
use super::decorator::{builtin_decorators, OperatorDecorator};
use super::Operator;
use crate::error::{CoreError, Result};
use std::collections::HashMap;

/// Registry of operators and decorators.
///
/// `get` resolves possibly `:`-chained names such as
/// `not:everyFact:greaterThan`: the suffix must name an operator, every
/// prefix segment a decorator, and decorators compose right-to-left over the
/// base.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    operators: HashMap<String, Operator>,
    decorators: HashMap<String, OperatorDecorator>,
}

impl OperatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            operators: HashMap::new(),
            decorators: HashMap::new(),
        }
    }

    /// Create a registry loaded with the built-in operators and decorators
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for operator in builtin_operators() {
            registry.add_operator(operator);
        }
        for decorator in builtin_decorators() {
            registry.add_decorator(decorator);
        }
        registry
    }

    /// Register an operator, replacing any operator with the same name
    pub fn add_operator(&mut self, operator: Operator) {
        self.operators.insert(operator.name().to_string(), operator);
    }

    /// Remove an operator; returns whether it was registered
    pub fn remove_operator(&mut self, name: &str) -> bool {
        self.operators.remove(name).is_some()
    }

    /// Register a decorator, replacing any decorator with the same name
    pub fn add_decorator(&mut self, decorator: OperatorDecorator) {
        self.decorators
            .insert(decorator.name().to_string(), decorator);
    }

    /// Remove a decorator; returns whether it was registered
    pub fn remove_decorator(&mut self, name: &str) -> bool {
        self.decorators.remove(name).is_some()
    }

    /// Resolve `name` to an operator, composing decorator chains as needed
    pub fn get(&self, name: &str) -> Result<Operator> {
        if let Some(operator) = self.operators.get(name) {
            return Ok(operator.clone());
        }

        let mut segments: Vec<&str> = name.split(':').collect();
        let base_name = segments.pop().unwrap_or_default();
        let base = self
            .operators
            .get(base_name)
            .ok_or_else(|| CoreError::UnknownOperator(base_name.to_string()))?;

        let mut evaluator = base.boxed_evaluator();
        for segment in segments.iter().rev() {
            let decorator = self
                .decorators
                .get(*segment)
                .ok_or_else(|| CoreError::UnknownDecorator((*segment).to_string()))?;
            evaluator = decorator.wrap(evaluator);
        }

        Ok(Operator::from_boxed(name, evaluator))
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
