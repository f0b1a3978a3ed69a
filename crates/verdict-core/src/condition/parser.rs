//! Parsing and structural validation of condition trees
//!
//! Conditions arrive as free-form JSON; this module turns them into the
//! typed tree with precise `InvalidCondition` errors. Deserialization for
//! [`Condition`] routes through the same checks so a rule loaded through
//! serde can never hold a structurally invalid tree.

use crate::condition::types::{
    AllCondition, AnyCondition, Condition, FactReference, LeafCondition, NodeProps, NotCondition,
    ReferenceCondition, ValueOrRef,
};
use crate::error::{CoreError, Result};
use crate::types::FactParams;
use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;

const SHAPE_KEYS: [&str; 5] = ["all", "any", "not", "condition", "fact"];

impl Condition {
    /// Parse a condition tree from a JSON string
    pub fn from_json(input: &str) -> Result<Self> {
        let json: Json = serde_json::from_str(input)?;
        Self::from_value(&json)
    }

    /// Parse a condition tree from a JSON value
    pub fn from_value(json: &Json) -> Result<Self> {
        let map = json.as_object().ok_or_else(|| {
            CoreError::InvalidCondition("condition node must be a JSON object".to_string())
        })?;

        let present: Vec<&str> = SHAPE_KEYS
            .iter()
            .copied()
            .filter(|key| map.contains_key(*key))
            .collect();
        match present.as_slice() {
            [] => {
                return Err(CoreError::InvalidCondition(
                    "condition node must contain one of 'all', 'any', 'not', 'condition' or 'fact'"
                        .to_string(),
                ))
            }
            [_] => {}
            keys => {
                return Err(CoreError::InvalidCondition(format!(
                    "condition node mixes shape keys: {}",
                    keys.join(", ")
                )))
            }
        }

        let props = parse_props(map)?;

        match present[0] {
            "all" => {
                let children = parse_children(&map["all"], "all")?;
                Ok(Condition::All(AllCondition {
                    all: children,
                    props,
                }))
            }
            "any" => {
                let children = parse_children(&map["any"], "any")?;
                Ok(Condition::Any(AnyCondition {
                    any: children,
                    props,
                }))
            }
            "not" => {
                let inner = &map["not"];
                if inner.is_array() {
                    return Err(CoreError::InvalidCondition(
                        "'not' expects a single condition, got an array".to_string(),
                    ));
                }
                Ok(Condition::Not(NotCondition {
                    not: Box::new(Condition::from_value(inner)?),
                    props,
                }))
            }
            "condition" => {
                let name = map["condition"].as_str().ok_or_else(|| {
                    CoreError::InvalidCondition("'condition' reference must be a string".to_string())
                })?;
                Ok(Condition::Reference(ReferenceCondition {
                    condition: name.to_string(),
                    props,
                }))
            }
            _ => parse_leaf(map, props),
        }
    }
}

fn parse_children(json: &Json, key: &str) -> Result<Vec<Condition>> {
    let items = json.as_array().ok_or_else(|| {
        CoreError::InvalidCondition(format!("'{key}' must be an array of conditions"))
    })?;
    items.iter().map(Condition::from_value).collect()
}

fn parse_leaf(map: &serde_json::Map<String, Json>, props: NodeProps) -> Result<Condition> {
    let fact = map["fact"]
        .as_str()
        .ok_or_else(|| CoreError::InvalidCondition("'fact' must be a string".to_string()))?;

    let operator = map
        .get("operator")
        .ok_or_else(|| {
            CoreError::InvalidCondition(format!("leaf condition '{fact}' requires 'operator'"))
        })?
        .as_str()
        .ok_or_else(|| CoreError::InvalidCondition("'operator' must be a string".to_string()))?;

    let value = map.get("value").ok_or_else(|| {
        CoreError::InvalidCondition(format!("leaf condition '{fact}' requires 'value'"))
    })?;

    let path = match map.get("path") {
        None => None,
        Some(Json::String(p)) => Some(p.clone()),
        Some(_) => {
            return Err(CoreError::InvalidCondition(
                "'path' must be a string".to_string(),
            ))
        }
    };

    let params = parse_params(map.get("params"))?;

    Ok(Condition::Leaf(LeafCondition {
        fact: fact.to_string(),
        operator: operator.to_string(),
        value: ValueOrRef::from_json_value(value),
        path,
        params,
        props,
    }))
}

fn parse_params(json: Option<&Json>) -> Result<Option<FactParams>> {
    match json {
        None => Ok(None),
        Some(Json::Object(map)) => Ok(Some(
            map.iter()
                .map(|(k, v)| (k.clone(), v.clone().into()))
                .collect(),
        )),
        Some(_) => Err(CoreError::InvalidCondition(
            "'params' must be an object".to_string(),
        )),
    }
}

fn parse_props(map: &serde_json::Map<String, Json>) -> Result<NodeProps> {
    let name = match map.get("name") {
        None => None,
        Some(Json::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(CoreError::InvalidCondition(
                "'name' must be a string".to_string(),
            ))
        }
    };

    Ok(NodeProps {
        priority: positive_int(map, "priority")?,
        weight: positive_int(map, "weight")?,
        name,
    })
}

fn positive_int(map: &serde_json::Map<String, Json>, key: &str) -> Result<Option<u32>> {
    match map.get(key) {
        None => Ok(None),
        Some(Json::Number(n)) => match n.as_u64() {
            Some(v) if v >= 1 && v <= u32::MAX as u64 => Ok(Some(v as u32)),
            _ => Err(CoreError::InvalidCondition(format!(
                "'{key}' must be a positive integer"
            ))),
        },
        Some(_) => Err(CoreError::InvalidCondition(format!(
            "'{key}' must be a positive integer"
        ))),
    }
}

impl ValueOrRef {
    /// Interpret a JSON value as either a fact reference or a literal.
    ///
    /// Any object carrying a string `fact` key is a reference; everything
    /// else, including objects without `fact`, is a literal.
    pub fn from_json_value(json: &Json) -> Self {
        if let Some(map) = json.as_object() {
            if let Some(Json::String(fact)) = map.get("fact") {
                let params = match map.get("params") {
                    Some(Json::Object(p)) => Some(
                        p.iter()
                            .map(|(k, v)| (k.clone(), v.clone().into()))
                            .collect::<FactParams>(),
                    ),
                    _ => None,
                };
                let path = match map.get("path") {
                    Some(Json::String(p)) => Some(p.clone()),
                    _ => None,
                };
                return ValueOrRef::Fact(FactReference {
                    fact: fact.clone(),
                    params,
                    path,
                });
            }
        }
        ValueOrRef::Literal(json.clone().into())
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = Json::deserialize(deserializer)?;
        Condition::from_value(&json).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for ValueOrRef {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = Json::deserialize(deserializer)?;
        Ok(ValueOrRef::from_json_value(&json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_parse_nested_tree() {
        let condition = Condition::from_json(
            r#"{
                "any": [
                    { "all": [
                        { "fact": "gameDuration", "operator": "equal", "value": 40 },
                        { "fact": "personalFoulCount", "operator": "greaterThanInclusive", "value": 5 }
                    ]},
                    { "not": { "fact": "personalFoulCount", "operator": "lessThan", "value": 6 } }
                ]
            }"#,
        )
        .unwrap();

        let mut leaves = Vec::new();
        condition.collect_leaves(&mut leaves);
        assert_eq!(leaves.len(), 3);
        assert!(condition.is_boolean_root());
    }

    #[test]
    fn test_parse_leaf_with_path_and_params() {
        let condition = Condition::from_json(
            r#"{
                "fact": "account",
                "operator": "equal",
                "value": "gold",
                "path": "$.tier",
                "params": { "region": "eu" },
                "weight": 3
            }"#,
        )
        .unwrap();

        match condition {
            Condition::Leaf(leaf) => {
                assert_eq!(leaf.path.as_deref(), Some("$.tier"));
                assert_eq!(
                    leaf.params.unwrap().get("region"),
                    Some(&Value::String("eu".to_string()))
                );
                assert_eq!(leaf.props.weight(), 3);
            }
            other => panic!("expected leaf, got {}", other.kind()),
        }
    }

    #[test]
    fn test_parse_fact_to_fact_comparison() {
        let condition = Condition::from_json(
            r#"{ "fact": "spend", "operator": "lessThan", "value": { "fact": "budget", "path": "$.monthly" } }"#,
        )
        .unwrap();

        match condition {
            Condition::Leaf(leaf) => match leaf.value {
                ValueOrRef::Fact(reference) => {
                    assert_eq!(reference.fact, "budget");
                    assert_eq!(reference.path.as_deref(), Some("$.monthly"));
                }
                ValueOrRef::Literal(_) => panic!("expected fact reference"),
            },
            other => panic!("expected leaf, got {}", other.kind()),
        }
    }

    #[test]
    fn test_reject_missing_shape_key() {
        let err = Condition::from_json(r#"{ "priority": 2 }"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCondition(_)));
    }

    #[test]
    fn test_reject_mixed_shape_keys() {
        let err = Condition::from_json(r#"{ "all": [], "any": [] }"#).unwrap_err();
        assert!(err.to_string().contains("mixes"));
    }

    #[test]
    fn test_reject_not_with_array() {
        let err = Condition::from_json(
            r#"{ "not": [ { "fact": "a", "operator": "equal", "value": 1 } ] }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("single condition"));
    }

    #[test]
    fn test_reject_all_with_non_array() {
        let err = Condition::from_json(
            r#"{ "all": { "fact": "a", "operator": "equal", "value": 1 } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_reject_incomplete_leaf() {
        let err = Condition::from_json(r#"{ "fact": "a", "operator": "equal" }"#).unwrap_err();
        assert!(err.to_string().contains("requires 'value'"));

        let err = Condition::from_json(r#"{ "fact": "a", "value": 1 }"#).unwrap_err();
        assert!(err.to_string().contains("requires 'operator'"));
    }

    #[test]
    fn test_reject_zero_priority_and_weight() {
        let err =
            Condition::from_json(r#"{ "fact": "a", "operator": "equal", "value": 1, "priority": 0 }"#)
                .unwrap_err();
        assert!(err.to_string().contains("positive integer"));

        let err =
            Condition::from_json(r#"{ "fact": "a", "operator": "equal", "value": 1, "weight": -2 }"#)
                .unwrap_err();
        assert!(err.to_string().contains("positive integer"));
    }

    #[test]
    fn test_serde_round_trip() {
        let source = r#"{
            "all": [
                { "fact": "performance", "operator": "equal", "value": 100, "weight": 3 },
                { "fact": "attendance", "operator": "equal", "value": 100, "name": "showed up" }
            ],
            "priority": 5
        }"#;
        let condition = Condition::from_json(source).unwrap();
        let json = serde_json::to_string(&condition).unwrap();
        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(condition, back);
    }

    #[test]
    fn test_literal_object_without_fact_key_stays_literal() {
        let parsed = ValueOrRef::from_json_value(&serde_json::json!({ "tier": "gold" }));
        assert!(matches!(parsed, ValueOrRef::Literal(Value::Object(_))));
    }
}
