//! Validation engine: partial-satisfaction analysis
//!
//! Answers, for a partial fact set, which rules are already satisfied, which
//! would be satisfied if the missing facts took favorable values, which are
//! unrelated to the given facts, and which actually fail. Classification
//! never emits events and never mutates the wrapped engine: every evaluation
//! runs on a throwaway engine carrying only the original operators, named
//! conditions, default-value providers and path resolver.

pub mod defaults;

pub use defaults::DefaultValueProvider;

use crate::engine::Engine;
use crate::error::Result;
use crate::result::RuleResult;
use crate::rule::Rule;
use chrono::{DateTime, Utc};
use defaults::{base_operator, default_for_operator};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use verdict_core::{Condition, Event, LeafCondition, Value, ValueOrRef};

/// Which of the four classification buckets a rule landed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SatisfactionType {
    FullySatisfied,
    PartiallySatisfied,
    Independent,
    Unsatisfied,
}

/// Why a rule was classified the way it was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationReason {
    IndependentAndSatisfied,
    IndependentMissingFacts,
    FullySatisfiedWithFact,
    PartiallySatisfiedMissingFacts,
    UnsatisfiedConditionMismatch,
    UnsatisfiedEvaluationError,
}

/// Classification of one rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleClassification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub priority: u32,
    pub score: f64,
    pub event: Option<Event>,
    pub satisfaction_type: SatisfactionType,
    pub reason: ClassificationReason,
    /// Synthesized defaults, present only for partially satisfied rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_facts: Option<HashMap<String, Value>>,
}

/// Aggregate counters over a classification
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationSummary {
    pub total_rules: usize,
    pub fully_satisfied: usize,
    pub partially_satisfied: usize,
    pub independent: usize,
    pub total_satisfied: usize,
    pub unsatisfied: usize,
    pub satisfaction_rate: f64,
}

/// Result of classifying every rule against a partial fact set
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub facts: HashMap<String, Value>,
    pub timestamp: DateTime<Utc>,
    pub fully_satisfied_rules: Vec<RuleClassification>,
    pub partially_satisfied_rules: Vec<RuleClassification>,
    pub independent_rules: Vec<RuleClassification>,
    pub unsatisfied_rules: Vec<RuleClassification>,
    pub summary: ClassificationSummary,
}

/// Rule engine extended with classification
pub struct ValidationEngine {
    engine: Engine,
    providers: HashMap<String, DefaultValueProvider>,
}

impl ValidationEngine {
    /// Wrap an engine; its rules, operators and named conditions drive
    /// classification
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            providers: HashMap::new(),
        }
    }

    /// Override default synthesis for an operator.
    ///
    /// Register under the base operator name; leaves using decorator chains
    /// (`not:greaterThan`) resolve their provider through the chain's base.
    pub fn register_default_value_provider<F>(&mut self, operator: impl Into<String>, provider: F)
    where
        F: Fn(&Value, &LeafCondition) -> Value + Send + Sync + 'static,
    {
        self.providers.insert(operator.into(), Arc::new(provider));
    }

    /// Remove a provider; returns whether one was registered
    pub fn unregister_default_value_provider(&mut self, operator: &str) -> bool {
        self.providers.remove(operator).is_some()
    }

    /// Classify every rule against `facts`, optionally focusing on one fact:
    /// rules not referencing the focused fact classify as independent
    pub async fn find_satisfied_rules(
        &self,
        facts: &HashMap<String, Value>,
        focused_fact: Option<&str>,
    ) -> Result<Classification> {
        let mut fully_satisfied_rules = Vec::new();
        let mut partially_satisfied_rules = Vec::new();
        let mut independent_rules = Vec::new();
        let mut unsatisfied_rules = Vec::new();

        for rule in self.engine.rules() {
            let entry = self.classify_rule(rule, facts, focused_fact).await;
            match entry.satisfaction_type {
                SatisfactionType::FullySatisfied => fully_satisfied_rules.push(entry),
                SatisfactionType::PartiallySatisfied => partially_satisfied_rules.push(entry),
                SatisfactionType::Independent => independent_rules.push(entry),
                SatisfactionType::Unsatisfied => unsatisfied_rules.push(entry),
            }
        }

        let total_rules = self.engine.rules().len();
        let total_satisfied = fully_satisfied_rules.len() + partially_satisfied_rules.len();
        let summary = ClassificationSummary {
            total_rules,
            fully_satisfied: fully_satisfied_rules.len(),
            partially_satisfied: partially_satisfied_rules.len(),
            independent: independent_rules.len(),
            total_satisfied,
            unsatisfied: unsatisfied_rules.len(),
            satisfaction_rate: if total_rules == 0 {
                0.0
            } else {
                total_satisfied as f64 / total_rules as f64
            },
        };

        Ok(Classification {
            facts: facts.clone(),
            timestamp: Utc::now(),
            fully_satisfied_rules,
            partially_satisfied_rules,
            independent_rules,
            unsatisfied_rules,
            summary,
        })
    }

    /// Classify with a single focused fact layered over `context`
    pub async fn find_partially_satisfied_rules(
        &self,
        fact_id: &str,
        value: impl Into<Value>,
        context: HashMap<String, Value>,
    ) -> Result<Classification> {
        let mut facts = context;
        facts.insert(fact_id.to_string(), value.into());
        self.find_satisfied_rules(&facts, Some(fact_id)).await
    }

    /// Classify against a context with no focused fact
    pub async fn find_partially_satisfied_rules_from_context(
        &self,
        context: HashMap<String, Value>,
    ) -> Result<Classification> {
        self.find_satisfied_rules(&context, None).await
    }

    async fn classify_rule(
        &self,
        rule: &Rule,
        facts: &HashMap<String, Value>,
        focused_fact: Option<&str>,
    ) -> RuleClassification {
        let leaves = self.effective_leaves(rule);
        let required = required_facts(&leaves);

        // A rule with no leaves anywhere has nothing to check
        if leaves.is_empty() {
            return independent(rule, 1.0);
        }

        match focused_fact {
            Some(focused) if !required.contains(focused) => return independent(rule, 0.0),
            None if !required.iter().any(|id| facts.contains_key(id)) => {
                return independent(rule, 0.0)
            }
            _ => {}
        }

        let missing: Vec<&String> = required
            .iter()
            .filter(|id| !facts.contains_key(*id))
            .collect();
        let uses_provided = required.iter().any(|id| facts.contains_key(id));

        if !missing.is_empty() && !uses_provided {
            let mut entry = independent(rule, 0.0);
            entry.reason = ClassificationReason::IndependentMissingFacts;
            return entry;
        }

        if !missing.is_empty() {
            let defaults = self.synthesize_defaults(&leaves, &missing);
            let mut combined = facts.clone();
            combined.extend(defaults.iter().map(|(k, v)| (k.clone(), v.clone())));

            return match self.evaluate_in_isolation(rule, &combined).await {
                Ok(result) if result.result => RuleClassification {
                    name: rule.name.clone(),
                    priority: rule.priority,
                    score: result.score,
                    event: Some(result.event),
                    satisfaction_type: SatisfactionType::PartiallySatisfied,
                    reason: ClassificationReason::PartiallySatisfiedMissingFacts,
                    missing_facts: Some(defaults),
                },
                Ok(_) => unsatisfied(rule, ClassificationReason::UnsatisfiedConditionMismatch, 0.0),
                Err(error) => {
                    tracing::warn!(rule = ?rule.name, %error, "classification evaluation failed");
                    unsatisfied(rule, ClassificationReason::UnsatisfiedEvaluationError, 0.0)
                }
            };
        }

        match self.evaluate_in_isolation(rule, facts).await {
            Ok(result) if result.result => RuleClassification {
                name: rule.name.clone(),
                priority: rule.priority,
                score: result.score,
                event: Some(result.event),
                satisfaction_type: SatisfactionType::FullySatisfied,
                reason: ClassificationReason::FullySatisfiedWithFact,
                missing_facts: None,
            },
            Ok(result) => unsatisfied(
                rule,
                ClassificationReason::UnsatisfiedConditionMismatch,
                result.score,
            ),
            Err(error) => {
                tracing::warn!(rule = ?rule.name, %error, "classification evaluation failed");
                unsatisfied(rule, ClassificationReason::UnsatisfiedEvaluationError, 0.0)
            }
        }
    }

    /// Synthesize a satisfying value for each missing fact, first leaf wins
    fn synthesize_defaults(
        &self,
        leaves: &[LeafCondition],
        missing: &[&String],
    ) -> HashMap<String, Value> {
        let mut defaults = HashMap::new();
        for leaf in leaves {
            if !missing.iter().any(|id| **id == leaf.fact) || defaults.contains_key(&leaf.fact) {
                continue;
            }
            let threshold = match &leaf.value {
                ValueOrRef::Literal(value) => value.clone(),
                // Fact-to-fact thresholds have no literal to mutate
                ValueOrRef::Fact(_) => Value::Null,
            };
            let value = match self.providers.get(base_operator(&leaf.operator)) {
                Some(provider) => provider(&threshold, leaf),
                None => default_for_operator(&leaf.operator, &threshold),
            };
            defaults.insert(leaf.fact.clone(), value);
        }
        defaults
    }

    /// Evaluate one rule on a throwaway engine: same operators, named
    /// conditions and path resolver, undefined facts tolerated, no listeners
    async fn evaluate_in_isolation(
        &self,
        rule: &Rule,
        facts: &HashMap<String, Value>,
    ) -> Result<RuleResult> {
        let mut options = self.engine.options().clone();
        options.allow_undefined_facts = true;

        let mut temp = Engine::with_options(options);
        temp.set_registry(self.engine.registry().clone());
        for (name, condition) in self.engine.named_conditions() {
            temp.set_condition(name.clone(), condition.clone())?;
        }
        temp.add_rule(rule.without_handlers())?;

        let outcome = temp.run(facts.clone()).await?;
        outcome
            .results
            .into_iter()
            .chain(outcome.failure_results)
            .next()
            .ok_or_else(|| {
                crate::error::EngineError::Handler("isolated run produced no result".to_string())
            })
    }

    /// Every leaf reachable from the rule, following named condition
    /// references through the engine's registry
    fn effective_leaves(&self, rule: &Rule) -> Vec<LeafCondition> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        collect_leaves_recursive(
            &rule.conditions,
            self.engine.named_conditions(),
            &mut out,
            &mut visited,
        );
        out
    }
}

impl Deref for ValidationEngine {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        &self.engine
    }
}

impl DerefMut for ValidationEngine {
    fn deref_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}

fn independent(rule: &Rule, score: f64) -> RuleClassification {
    RuleClassification {
        name: rule.name.clone(),
        priority: rule.priority,
        score,
        event: None,
        satisfaction_type: SatisfactionType::Independent,
        reason: ClassificationReason::IndependentAndSatisfied,
        missing_facts: None,
    }
}

fn unsatisfied(rule: &Rule, reason: ClassificationReason, score: f64) -> RuleClassification {
    RuleClassification {
        name: rule.name.clone(),
        priority: rule.priority,
        score,
        event: None,
        satisfaction_type: SatisfactionType::Unsatisfied,
        reason,
        missing_facts: None,
    }
}

/// Fact ids referenced by the given leaves, including right-hand-side fact
/// references
fn required_facts(leaves: &[LeafCondition]) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for leaf in leaves {
        out.insert(leaf.fact.clone());
        if let ValueOrRef::Fact(reference) = &leaf.value {
            out.insert(reference.fact.clone());
        }
    }
    out
}

fn collect_leaves_recursive(
    condition: &Condition,
    named: &HashMap<String, Condition>,
    out: &mut Vec<LeafCondition>,
    visited: &mut HashSet<String>,
) {
    let mut leaves = Vec::new();
    condition.collect_leaves(&mut leaves);
    out.extend(leaves.into_iter().cloned());

    let mut references = Vec::new();
    condition.collect_references(&mut references);
    for name in references {
        if visited.insert(name.to_string()) {
            if let Some(target) = named.get(name) {
                collect_leaves_recursive(target, named, out, visited);
            }
        }
    }
}
