//! Condition evaluation
//!
//! Walks a condition tree against an almanac, producing the annotated
//! [`ConditionResult`] mirror. Scoring algebra:
//!
//! - `all`: weighted arithmetic mean of the children (empty ⇒ 1)
//! - `any`: score of the child with the highest weighted score, first on
//!   ties (empty ⇒ 0)
//! - `not`: 1 if the child scored below 1, else 0
//!
//! Every child is evaluated; there is no short-circuiting, since the
//! weighted aggregate needs every score. Children are visited in priority
//! order (explicit child priority, else the fact's registered priority),
//! which is observable only through side effects such as cache fills.

use crate::almanac::Almanac;
use crate::error::{EngineError, Result};
use crate::result::{
    AllResult, Annotation, AnyResult, ConditionResult, LeafResult, NotResult, ReferenceResult,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use verdict_core::{Condition, FactParams, LeafCondition, NodeProps, OperatorRegistry};

/// Engine state the evaluator consults: operators and named conditions
pub(crate) struct EvalContext<'a> {
    pub registry: &'a OperatorRegistry,
    pub conditions: &'a HashMap<String, Condition>,
    pub allow_undefined_conditions: bool,
}

fn annotate(props: &NodeProps, score: f64) -> Annotation {
    Annotation {
        score,
        result: score >= 1.0,
        weight: props.weight(),
        name: props.name.clone(),
    }
}

pub(crate) fn evaluate<'a>(
    condition: &'a Condition,
    ctx: &'a EvalContext<'a>,
    almanac: &'a Almanac,
) -> BoxFuture<'a, Result<ConditionResult>> {
    async move {
        match condition {
            Condition::All(node) => {
                let children = evaluate_children(&node.all, ctx, almanac).await?;
                let score = weighted_mean(&children);
                Ok(ConditionResult::All(AllResult {
                    all: children,
                    annotation: annotate(&node.props, score),
                }))
            }
            Condition::Any(node) => {
                let children = evaluate_children(&node.any, ctx, almanac).await?;
                let score = weighted_best(&children);
                Ok(ConditionResult::Any(AnyResult {
                    any: children,
                    annotation: annotate(&node.props, score),
                }))
            }
            Condition::Not(node) => {
                let child = evaluate(&node.not, ctx, almanac).await?;
                let score = if child.score() < 1.0 { 1.0 } else { 0.0 };
                Ok(ConditionResult::Not(NotResult {
                    not: Box::new(child),
                    annotation: annotate(&node.props, score),
                }))
            }
            Condition::Reference(node) => match ctx.conditions.get(&node.condition) {
                Some(target) => {
                    let inner = evaluate(target, ctx, almanac).await?;
                    let score = inner.score();
                    Ok(ConditionResult::Reference(ReferenceResult {
                        condition: node.condition.clone(),
                        resolved: Some(Box::new(inner)),
                        annotation: annotate(&node.props, score),
                    }))
                }
                None if ctx.allow_undefined_conditions => {
                    tracing::debug!(condition = %node.condition, "undefined condition scored 0");
                    Ok(ConditionResult::Reference(ReferenceResult {
                        condition: node.condition.clone(),
                        resolved: None,
                        annotation: annotate(&node.props, 0.0),
                    }))
                }
                None => Err(EngineError::UnknownCondition(node.condition.clone())),
            },
            Condition::Leaf(leaf) => evaluate_leaf(leaf, ctx, almanac).await,
        }
    }
    .boxed()
}

async fn evaluate_leaf(
    leaf: &LeafCondition,
    ctx: &EvalContext<'_>,
    almanac: &Almanac,
) -> Result<ConditionResult> {
    let rhs = almanac.get_value(&leaf.value).await?;

    let empty = FactParams::new();
    let params = leaf.params.as_ref().unwrap_or(&empty);
    let lhs = almanac
        .fact_value(&leaf.fact, params, leaf.path.as_deref())
        .await?;

    let operator = ctx.registry.get(&leaf.operator)?;
    let score = operator.apply(&lhs, &rhs);
    tracing::trace!(
        fact = %leaf.fact,
        operator = %leaf.operator,
        score,
        "leaf evaluated"
    );

    Ok(ConditionResult::Leaf(LeafResult {
        fact: leaf.fact.clone(),
        operator: leaf.operator.clone(),
        value: leaf.value.clone(),
        path: leaf.path.clone(),
        params: leaf.params.clone(),
        fact_result: lhs,
        value_result: rhs,
        annotation: annotate(&leaf.props, score),
    }))
}

/// Evaluate every child, visiting in descending priority but returning
/// results in the original order
async fn evaluate_children(
    children: &[Condition],
    ctx: &EvalContext<'_>,
    almanac: &Almanac,
) -> Result<Vec<ConditionResult>> {
    let mut order: Vec<(usize, u32)> = Vec::with_capacity(children.len());
    for (index, child) in children.iter().enumerate() {
        let priority = match child.props().priority {
            Some(priority) => priority,
            None => match child {
                Condition::Leaf(leaf) => almanac.fact_priority(&leaf.fact).await,
                _ => 1,
            },
        };
        order.push((index, priority));
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let mut slots: Vec<Option<ConditionResult>> = vec![None; children.len()];
    for (index, _) in order {
        slots[index] = Some(evaluate(&children[index], ctx, almanac).await?);
    }
    Ok(slots.into_iter().flatten().collect())
}

/// `all` aggregation: Σ(wᵢ·sᵢ) / Σ(wᵢ), empty ⇒ 1
fn weighted_mean(children: &[ConditionResult]) -> f64 {
    if children.is_empty() {
        return 1.0;
    }
    let total_weight: f64 = children.iter().map(|c| c.weight() as f64).sum();
    let weighted_sum: f64 = children
        .iter()
        .map(|c| c.weight() as f64 * c.score())
        .sum();
    weighted_sum / total_weight
}

/// `any` aggregation: score of the child maximizing wᵢ·sᵢ, first on ties,
/// empty ⇒ 0
fn weighted_best(children: &[ConditionResult]) -> f64 {
    let mut best: Option<(f64, f64)> = None;
    for child in children {
        let weighted = child.weight() as f64 * child.score();
        match best {
            Some((best_weighted, _)) if weighted <= best_weighted => {}
            _ => best = Some((weighted, child.score())),
        }
    }
    best.map(|(_, score)| score).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{Annotation, LeafResult};
    use verdict_core::{Value, ValueOrRef};

    fn leaf_result(score: f64, weight: u32) -> ConditionResult {
        ConditionResult::Leaf(LeafResult {
            fact: "f".to_string(),
            operator: "equal".to_string(),
            value: ValueOrRef::Literal(Value::Number(0.0)),
            path: None,
            params: None,
            fact_result: Value::Null,
            value_result: Value::Null,
            annotation: Annotation {
                score,
                result: score >= 1.0,
                weight,
                name: None,
            },
        })
    }

    #[test]
    fn test_weighted_mean() {
        // 3:1 weighting of a pass and a miss
        let children = vec![leaf_result(1.0, 3), leaf_result(0.0, 1)];
        assert_eq!(weighted_mean(&children), 0.75);
        assert_eq!(weighted_mean(&[]), 1.0);
    }

    #[test]
    fn test_weighted_best_returns_underlying_score() {
        // Child 0: weighted 2*0.6 = 1.2; child 1: weighted 1*1.0 = 1.0.
        // The best weighted child wins, but its raw score is reported.
        let children = vec![leaf_result(0.6, 2), leaf_result(1.0, 1)];
        assert_eq!(weighted_best(&children), 0.6);
        assert_eq!(weighted_best(&[]), 0.0);
    }

    #[test]
    fn test_weighted_best_tie_picks_first() {
        let children = vec![leaf_result(0.5, 2), leaf_result(1.0, 1)];
        assert_eq!(weighted_best(&children), 0.5);
    }
}
