//! Rule engine
//!
//! Owns the rule list, operator registry, named conditions and registered
//! facts. `run` partitions rules into priority buckets (highest first),
//! evaluates each bucket's rules concurrently against a fresh almanac, and
//! emits `success`/`failure` plus event-type notifications as rules settle.

use crate::almanac::{Almanac, EventOutcome};
use crate::config::EngineOptions;
use crate::error::Result;
use crate::evaluator::{evaluate, EvalContext};
use crate::events::EventHandler;
use crate::fact::Fact;
use crate::result::{RuleResult, RunOutcome};
use crate::rule::Rule;
use futures::future::try_join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use verdict_core::{
    Condition, CoreError, Event, FactReference, Operator, OperatorDecorator, OperatorRegistry,
    Value, ValueOrRef,
};

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Ready,
    Running,
    Finished,
}

impl EngineStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => EngineStatus::Running,
            2 => EngineStatus::Finished,
            _ => EngineStatus::Ready,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            EngineStatus::Ready => 0,
            EngineStatus::Running => 1,
            EngineStatus::Finished => 2,
        }
    }
}

/// The rule engine
pub struct Engine {
    rules: Vec<Rule>,
    registry: OperatorRegistry,
    conditions: HashMap<String, Condition>,
    facts: HashMap<String, Fact>,
    options: EngineOptions,
    status: AtomicU8,
    success_handlers: Vec<Arc<dyn EventHandler>>,
    failure_handlers: Vec<Arc<dyn EventHandler>>,
    typed_handlers: HashMap<String, Vec<Arc<dyn EventHandler>>>,
}

impl Engine {
    /// Create an engine with default options and the built-in operator set
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Create an engine with explicit options
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            rules: Vec::new(),
            registry: OperatorRegistry::with_defaults(),
            conditions: HashMap::new(),
            facts: HashMap::new(),
            options,
            status: AtomicU8::new(EngineStatus::Ready.as_u8()),
            success_handlers: Vec::new(),
            failure_handlers: Vec::new(),
            typed_handlers: HashMap::new(),
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> EngineStatus {
        EngineStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    /// Signal a running engine to finish after the current priority bucket
    pub fn stop(&self) {
        self.status
            .store(EngineStatus::Finished.as_u8(), Ordering::SeqCst);
    }

    /// Add a rule after validating it
    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        rule.validate()?;
        self.rules.push(rule);
        Ok(())
    }

    /// Replace every rule sharing the given rule's name.
    ///
    /// Returns whether any rule was replaced; the rule must be named.
    pub fn update_rule(&mut self, rule: Rule) -> Result<bool> {
        rule.validate()?;
        let name = rule.name.clone().ok_or_else(|| {
            CoreError::InvalidRule("update_rule requires a named rule".to_string())
        })?;
        let before = self.rules.len();
        self.rules.retain(|existing| existing.name.as_deref() != Some(name.as_str()));
        let replaced = self.rules.len() < before;
        self.rules.push(rule);
        Ok(replaced)
    }

    /// Remove every rule with the given name; returns whether any matched
    pub fn remove_rule(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules
            .retain(|rule| rule.name.as_deref() != Some(name));
        self.rules.len() < before
    }

    /// Rules currently registered, in insertion order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Register a named condition for `{ "condition": ... }` references
    pub fn set_condition(&mut self, name: impl Into<String>, condition: Condition) -> Result<()> {
        if !condition.is_boolean_root() {
            return Err(CoreError::InvalidCondition(
                "named conditions must root at 'all', 'any', 'not' or 'condition'".to_string(),
            )
            .into());
        }
        self.conditions.insert(name.into(), condition);
        Ok(())
    }

    /// Remove a named condition; returns whether it was set
    pub fn remove_condition(&mut self, name: &str) -> bool {
        self.conditions.remove(name).is_some()
    }

    /// Register a fact that survives across runs
    pub fn add_fact(&mut self, fact: Fact) {
        self.facts.insert(fact.id().to_string(), fact);
    }

    /// Remove a registered fact; returns whether it was registered
    pub fn remove_fact(&mut self, id: &str) -> bool {
        self.facts.remove(id).is_some()
    }

    /// Look up a registered fact
    pub fn get_fact(&self, id: &str) -> Option<&Fact> {
        self.facts.get(id)
    }

    /// Register a custom operator
    pub fn add_operator(&mut self, operator: Operator) {
        self.registry.add_operator(operator);
    }

    /// Remove an operator; returns whether it was registered
    pub fn remove_operator(&mut self, name: &str) -> bool {
        self.registry.remove_operator(name)
    }

    /// Register a custom operator decorator
    pub fn add_decorator(&mut self, decorator: OperatorDecorator) {
        self.registry.add_decorator(decorator);
    }

    /// Remove a decorator; returns whether it was registered
    pub fn remove_decorator(&mut self, name: &str) -> bool {
        self.registry.remove_decorator(name)
    }

    /// Subscribe to every passing rule
    pub fn on_success(&mut self, handler: Arc<dyn EventHandler>) {
        self.success_handlers.push(handler);
    }

    /// Subscribe to every failing rule
    pub fn on_failure(&mut self, handler: Arc<dyn EventHandler>) {
        self.failure_handlers.push(handler);
    }

    /// Subscribe to a specific event type, emitted when a rule carrying it
    /// passes
    pub fn on(&mut self, event_type: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.typed_handlers
            .entry(event_type.into())
            .or_default()
            .push(handler);
    }

    /// Engine options
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub(crate) fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub(crate) fn set_registry(&mut self, registry: OperatorRegistry) {
        self.registry = registry;
    }

    pub(crate) fn named_conditions(&self) -> &HashMap<String, Condition> {
        &self.conditions
    }

    /// Evaluate every rule against the given runtime facts
    pub async fn run(&self, runtime_facts: HashMap<String, Value>) -> Result<RunOutcome> {
        let almanac = Arc::new(Almanac::new(&self.options));
        self.run_with_almanac(runtime_facts, almanac).await
    }

    /// Evaluate every rule against a caller-supplied almanac
    pub async fn run_with_almanac(
        &self,
        runtime_facts: HashMap<String, Value>,
        almanac: Arc<Almanac>,
    ) -> Result<RunOutcome> {
        self.status
            .store(EngineStatus::Running.as_u8(), Ordering::SeqCst);
        tracing::info!(rules = self.rules.len(), "engine run started");

        for fact in self.facts.values() {
            almanac.add_fact(fact.clone()).await;
        }
        for (id, value) in runtime_facts {
            almanac.add_runtime_value(id, value).await;
        }

        let mut buckets: BTreeMap<u32, Vec<&Rule>> = BTreeMap::new();
        for rule in &self.rules {
            buckets.entry(rule.priority).or_default().push(rule);
        }

        for (priority, bucket) in buckets.iter().rev() {
            if self.status() == EngineStatus::Finished {
                tracing::debug!(priority = *priority, "engine stopped; skipping remaining buckets");
                break;
            }
            tracing::debug!(
                priority = *priority,
                rules = bucket.len(),
                "evaluating priority bucket"
            );
            try_join_all(
                bucket
                    .iter()
                    .map(|rule| self.evaluate_rule(rule, almanac.as_ref())),
            )
            .await?;
        }

        self.status
            .store(EngineStatus::Finished.as_u8(), Ordering::SeqCst);

        let mut results = Vec::new();
        let mut failure_results = Vec::new();
        for result in almanac.results().await {
            if result.result {
                results.push(result);
            } else {
                failure_results.push(result);
            }
        }
        let events = almanac.events(EventOutcome::Success).await;
        let failure_events = almanac.events(EventOutcome::Failure).await;
        tracing::info!(
            passed = results.len(),
            failed = failure_results.len(),
            "engine run finished"
        );

        Ok(RunOutcome {
            results,
            failure_results,
            events,
            failure_events,
            almanac,
        })
    }

    async fn evaluate_rule(&self, rule: &Rule, almanac: &Almanac) -> Result<()> {
        let ctx = EvalContext {
            registry: &self.registry,
            conditions: &self.conditions,
            allow_undefined_conditions: self.options.allow_undefined_conditions,
        };
        let conditions = evaluate(&rule.conditions, &ctx, almanac).await?;
        let score = conditions.score();
        let passed = score >= 1.0;

        let mut event = rule.event.clone();
        if self.options.replace_facts_in_event_params {
            self.resolve_event_params(&mut event, almanac).await?;
        }

        let rule_result = RuleResult {
            name: rule.name.clone(),
            priority: rule.priority,
            event: event.clone(),
            result: passed,
            score,
            conditions,
        };
        tracing::debug!(rule = ?rule.name, score, passed, "rule settled");

        almanac.add_result(rule_result.clone()).await;
        let outcome = if passed {
            EventOutcome::Success
        } else {
            EventOutcome::Failure
        };
        almanac.add_event(event.clone(), outcome).await;

        // Rule-level handler first, then engine-wide subscribers, then the
        // event-type emission on success. Each handler is awaited before the
        // next fires for this rule.
        rule.emit(&rule_result, almanac).await?;
        let subscribers = if passed {
            &self.success_handlers
        } else {
            &self.failure_handlers
        };
        for handler in subscribers {
            handler.handle(&event, almanac, &rule_result).await?;
        }
        if passed {
            if let Some(handlers) = self.typed_handlers.get(&event.event_type) {
                for handler in handlers {
                    handler.handle(&event, almanac, &rule_result).await?;
                }
            }
        }
        Ok(())
    }

    async fn resolve_event_params(&self, event: &mut Event, almanac: &Almanac) -> Result<()> {
        if let Some(params) = event.params.as_mut() {
            for value in params.values_mut() {
                if let Some(reference) = FactReference::from_runtime_value(value) {
                    *value = almanac.get_value(&ValueOrRef::Fact(reference)).await?;
                }
            }
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            EngineStatus::Ready,
            EngineStatus::Running,
            EngineStatus::Finished,
        ] {
            assert_eq!(EngineStatus::from_u8(status.as_u8()), status);
        }
    }

    #[test]
    fn test_add_and_remove_rules_by_name() {
        let mut engine = Engine::new();
        engine
            .add_rule(Rule::from_json(RULE_A).unwrap())
            .unwrap();
        engine
            .add_rule(Rule::from_json(RULE_A).unwrap())
            .unwrap();
        assert_eq!(engine.rules().len(), 2);

        // Removal by name takes out every match
        assert!(engine.remove_rule("a"));
        assert!(engine.rules().is_empty());
        assert!(!engine.remove_rule("a"));
    }

    #[test]
    fn test_update_rule_replaces_by_name() {
        let mut engine = Engine::new();
        engine
            .add_rule(Rule::from_json(RULE_A).unwrap())
            .unwrap();

        let updated = Rule::from_json(RULE_A).unwrap().with_priority(7);
        assert!(engine.update_rule(updated).unwrap());
        assert_eq!(engine.rules().len(), 1);
        assert_eq!(engine.rules()[0].priority, 7);

        let unnamed = Rule::from_json(
            r#"{ "conditions": { "all": [] }, "event": { "type": "x" } }"#,
        )
        .unwrap();
        assert!(engine.update_rule(unnamed).is_err());
    }

    #[test]
    fn test_set_condition_requires_boolean_root() {
        let mut engine = Engine::new();
        let leaf =
            Condition::from_json(r#"{ "fact": "a", "operator": "equal", "value": 1 }"#).unwrap();
        assert!(engine.set_condition("bad", leaf).is_err());

        let tree = Condition::from_json(r#"{ "all": [] }"#).unwrap();
        engine.set_condition("good", tree).unwrap();
        assert!(engine.remove_condition("good"));
        assert!(!engine.remove_condition("good"));
    }

    const RULE_A: &str = r#"{
        "name": "a",
        "conditions": { "all": [] },
        "event": { "type": "noop" }
    }"#;
}
