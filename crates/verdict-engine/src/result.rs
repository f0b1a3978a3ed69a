//! Evaluation results
//!
//! Evaluation never mutates a rule's condition tree. Instead the evaluator
//! builds an owned, annotated mirror of the tree — [`ConditionResult`] —
//! carrying per-node scores and verdicts, plus the resolved operands for
//! leaves. [`RuleResult`] bundles the annotated tree with the rule's event
//! and aggregate score.

use crate::almanac::Almanac;
use serde::Serialize;
use std::sync::Arc;
use verdict_core::{Event, FactParams, Value, ValueOrRef};

/// Score, verdict and weight recorded on every result node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// Node score in `[0,1]`
    pub score: f64,
    /// Verdict: `score >= 1`
    pub result: bool,
    /// Effective weight the node contributed to its parent
    pub weight: u32,
    /// Label copied from the condition, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Annotated mirror of a condition tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConditionResult {
    All(AllResult),
    Any(AnyResult),
    Not(NotResult),
    Reference(ReferenceResult),
    Leaf(LeafResult),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllResult {
    pub all: Vec<ConditionResult>,
    #[serde(flatten)]
    pub annotation: Annotation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnyResult {
    pub any: Vec<ConditionResult>,
    #[serde(flatten)]
    pub annotation: Annotation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotResult {
    pub not: Box<ConditionResult>,
    #[serde(flatten)]
    pub annotation: Annotation,
}

/// A resolved `{ "condition": ... }` reference.
///
/// The referenced tree is cloned per evaluation, so rules sharing a named
/// condition never see each other's annotations. `resolved` is absent when
/// the engine tolerates undefined conditions and the name was missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceResult {
    pub condition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Box<ConditionResult>>,
    #[serde(flatten)]
    pub annotation: Annotation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafResult {
    pub fact: String,
    pub operator: String,
    pub value: ValueOrRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<FactParams>,
    /// Resolved left-hand side
    pub fact_result: Value,
    /// Resolved right-hand side
    pub value_result: Value,
    #[serde(flatten)]
    pub annotation: Annotation,
}

impl ConditionResult {
    /// Annotation shared by every node kind
    pub fn annotation(&self) -> &Annotation {
        match self {
            ConditionResult::All(node) => &node.annotation,
            ConditionResult::Any(node) => &node.annotation,
            ConditionResult::Not(node) => &node.annotation,
            ConditionResult::Reference(node) => &node.annotation,
            ConditionResult::Leaf(node) => &node.annotation,
        }
    }

    /// Node score in `[0,1]`
    pub fn score(&self) -> f64 {
        self.annotation().score
    }

    /// Node verdict
    pub fn result(&self) -> bool {
        self.annotation().result
    }

    /// Weight the node contributed to its parent
    pub fn weight(&self) -> u32 {
        self.annotation().weight
    }
}

/// Outcome of evaluating one rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub priority: u32,
    pub event: Event,
    pub result: bool,
    pub score: f64,
    pub conditions: ConditionResult,
}

/// Aggregated outcome of a run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Results of rules whose score reached 1
    pub results: Vec<RuleResult>,
    /// Results of rules that fell short
    pub failure_results: Vec<RuleResult>,
    /// Events emitted by passing rules, in settle order
    pub events: Vec<Event>,
    /// Events emitted by failing rules, in settle order
    pub failure_events: Vec<Event>,
    /// The run's almanac; read-only after the run completes
    pub almanac: Arc<Almanac>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_serialization_uses_camel_case_annotations() {
        let leaf = ConditionResult::Leaf(LeafResult {
            fact: "score".to_string(),
            operator: "greaterThan".to_string(),
            value: ValueOrRef::Literal(Value::Number(80.0)),
            path: None,
            params: None,
            fact_result: Value::Number(81.0),
            value_result: Value::Number(80.0),
            annotation: Annotation {
                score: 1.0,
                result: true,
                weight: 1,
                name: None,
            },
        });

        let json = serde_json::to_value(&leaf).unwrap();
        assert_eq!(json["factResult"], serde_json::json!(81.0));
        assert_eq!(json["valueResult"], serde_json::json!(80.0));
        assert_eq!(json["result"], serde_json::json!(true));
    }

    #[test]
    fn test_nested_tree_serialization_keeps_shape() {
        let tree = ConditionResult::All(AllResult {
            all: vec![ConditionResult::Not(NotResult {
                not: Box::new(ConditionResult::Reference(ReferenceResult {
                    condition: "highRisk".to_string(),
                    resolved: None,
                    annotation: Annotation {
                        score: 0.0,
                        result: false,
                        weight: 1,
                        name: None,
                    },
                })),
                annotation: Annotation {
                    score: 1.0,
                    result: true,
                    weight: 2,
                    name: Some("inverted".to_string()),
                },
            })],
            annotation: Annotation {
                score: 1.0,
                result: true,
                weight: 1,
                name: None,
            },
        });

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["all"][0]["weight"], serde_json::json!(2));
        assert_eq!(json["all"][0]["name"], serde_json::json!("inverted"));
        assert_eq!(
            json["all"][0]["not"]["condition"],
            serde_json::json!("highRisk")
        );
    }
}
