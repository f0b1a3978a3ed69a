//! Condition tree type definitions

use crate::types::{FactParams, Value};
use serde::Serialize;

/// Attributes shared by every condition node
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeProps {
    /// Evaluation ordering hint, highest first (positive integer)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    /// Contribution of this node to its parent's aggregate (positive integer)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,

    /// Optional label carried through to the result tree
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl NodeProps {
    /// Effective weight of the node (default 1)
    pub fn weight(&self) -> u32 {
        self.weight.unwrap_or(1)
    }
}

/// A condition tree node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Condition {
    /// Weighted conjunction: score is the weighted mean of the children
    All(AllCondition),
    /// Weighted disjunction: score is the best weighted child's score
    Any(AnyCondition),
    /// Binary negation of a single child
    Not(NotCondition),
    /// Reference to a named condition registered on the engine
    Reference(ReferenceCondition),
    /// Leaf comparison of a fact against a value
    Leaf(LeafCondition),
}

/// `{ "all": [...] }` node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllCondition {
    pub all: Vec<Condition>,
    #[serde(flatten)]
    pub props: NodeProps,
}

/// `{ "any": [...] }` node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnyCondition {
    pub any: Vec<Condition>,
    #[serde(flatten)]
    pub props: NodeProps,
}

/// `{ "not": {...} }` node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotCondition {
    pub not: Box<Condition>,
    #[serde(flatten)]
    pub props: NodeProps,
}

/// `{ "condition": "name" }` node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceCondition {
    pub condition: String,
    #[serde(flatten)]
    pub props: NodeProps,
}

/// Leaf comparison node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafCondition {
    /// Fact supplying the left-hand side
    pub fact: String,

    /// Operator name, possibly decorator-chained (`"not:everyFact:greaterThan"`)
    pub operator: String,

    /// Right-hand side: literal value or fact reference
    pub value: ValueOrRef,

    /// Optional projection applied to the resolved fact value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Optional parameters forwarded to the fact computation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<FactParams>,

    #[serde(flatten)]
    pub props: NodeProps,
}

/// A literal value or a reference to another fact
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValueOrRef {
    /// `{ "fact": ..., "params"?: ..., "path"?: ... }`
    Fact(FactReference),
    /// Any other JSON value
    Literal(Value),
}

/// Reference to a fact, used for fact-to-fact comparison and event params
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactReference {
    pub fact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<FactParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl FactReference {
    /// Interpret a runtime value as a fact reference.
    ///
    /// Event params carry references as plain objects with a string `fact`
    /// key, the same shape leaf values use.
    pub fn from_runtime_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let fact = map.get("fact")?.as_str()?.to_string();
        let params = map
            .get("params")
            .and_then(Value::as_object)
            .map(|p| p.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        let path = map.get("path").and_then(Value::as_str).map(str::to_string);
        Some(FactReference { fact, params, path })
    }
}

impl Condition {
    /// Shared node attributes
    pub fn props(&self) -> &NodeProps {
        match self {
            Condition::All(node) => &node.props,
            Condition::Any(node) => &node.props,
            Condition::Not(node) => &node.props,
            Condition::Reference(node) => &node.props,
            Condition::Leaf(node) => &node.props,
        }
    }

    /// Discriminator name, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Condition::All(_) => "all",
            Condition::Any(_) => "any",
            Condition::Not(_) => "not",
            Condition::Reference(_) => "condition",
            Condition::Leaf(_) => "fact",
        }
    }

    /// True for nodes allowed at the root of a rule's condition tree
    pub fn is_boolean_root(&self) -> bool {
        !matches!(self, Condition::Leaf(_))
    }

    /// Collect every leaf in this subtree, depth first
    pub fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a LeafCondition>) {
        match self {
            Condition::All(node) => {
                for child in &node.all {
                    child.collect_leaves(out);
                }
            }
            Condition::Any(node) => {
                for child in &node.any {
                    child.collect_leaves(out);
                }
            }
            Condition::Not(node) => node.not.collect_leaves(out),
            Condition::Reference(_) => {}
            Condition::Leaf(leaf) => out.push(leaf),
        }
    }

    /// Collect the names of every `{ "condition": ... }` reference in this subtree
    pub fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::All(node) => {
                for child in &node.all {
                    child.collect_references(out);
                }
            }
            Condition::Any(node) => {
                for child in &node.any {
                    child.collect_references(out);
                }
            }
            Condition::Not(node) => node.not.collect_references(out),
            Condition::Reference(reference) => out.push(&reference.condition),
            Condition::Leaf(_) => {}
        }
    }
}
