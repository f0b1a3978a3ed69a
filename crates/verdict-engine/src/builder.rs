//! Builder pattern for the rule engine

use crate::config::EngineOptions;
use crate::engine::Engine;
use crate::error::Result;
use crate::fact::Fact;
use crate::rule::Rule;
use verdict_core::{Condition, Operator, OperatorDecorator, Value};

/// Fluent construction of an [`Engine`]
pub struct EngineBuilder {
    options: EngineOptions,
    rules: Vec<Rule>,
    rule_sources: Vec<String>,
    facts: Vec<Fact>,
    operators: Vec<Operator>,
    decorators: Vec<OperatorDecorator>,
    conditions: Vec<(String, Condition)>,
}

impl EngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            options: EngineOptions::default(),
            rules: Vec::new(),
            rule_sources: Vec::new(),
            facts: Vec::new(),
            operators: Vec::new(),
            decorators: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Add a rule
    pub fn add_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add a rule from its JSON representation; parsed at `build`
    pub fn add_rule_json(mut self, json: impl Into<String>) -> Self {
        self.rule_sources.push(json.into());
        self
    }

    /// Register a fact
    pub fn add_fact(mut self, fact: Fact) -> Self {
        self.facts.push(fact);
        self
    }

    /// Register a custom operator
    pub fn add_operator(mut self, operator: Operator) -> Self {
        self.operators.push(operator);
        self
    }

    /// Register a custom decorator
    pub fn add_decorator(mut self, decorator: OperatorDecorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Register a named condition
    pub fn set_condition(mut self, name: impl Into<String>, condition: Condition) -> Self {
        self.conditions.push((name.into(), condition));
        self
    }

    /// Missing facts resolve to null instead of rejecting the run
    pub fn allow_undefined_facts(mut self, allow: bool) -> Self {
        self.options.allow_undefined_facts = allow;
        self
    }

    /// Missing named conditions score 0 instead of rejecting the run
    pub fn allow_undefined_conditions(mut self, allow: bool) -> Self {
        self.options.allow_undefined_conditions = allow;
        self
    }

    /// Resolve fact references in event params before emission
    pub fn replace_facts_in_event_params(mut self, replace: bool) -> Self {
        self.options.replace_facts_in_event_params = replace;
        self
    }

    /// Install a custom path resolver
    pub fn with_path_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&Value, &str) -> Value + Send + Sync + 'static,
    {
        self.options = self.options.with_path_resolver(resolver);
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<Engine> {
        let mut engine = Engine::with_options(self.options);
        for operator in self.operators {
            engine.add_operator(operator);
        }
        for decorator in self.decorators {
            engine.add_decorator(decorator);
        }
        for (name, condition) in self.conditions {
            engine.set_condition(name, condition)?;
        }
        for fact in self.facts {
            engine.add_fact(fact);
        }
        for rule in self.rules {
            engine.add_rule(rule)?;
        }
        for source in self.rule_sources {
            engine.add_rule(Rule::from_json(&source)?)?;
        }
        Ok(engine)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
