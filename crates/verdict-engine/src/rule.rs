//! Rule definition
//!
//! A rule pairs a condition tree with the event it emits and a scheduling
//! priority. Rules round-trip through JSON; the optional success/failure
//! handlers are runtime-only and never serialized.

use crate::events::EventHandler;
use crate::result::RuleResult;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;
use verdict_core::{Condition, CoreError, Event};

/// A declarative rule
#[derive(Clone)]
pub struct Rule {
    /// Optional name; used by `update_rule`/`remove_rule` and carried into results
    pub name: Option<String>,
    /// Scheduling priority, highest first (minimum 1)
    pub priority: u32,
    /// Condition tree; the root must be `all`, `any`, `not` or a reference
    pub conditions: Condition,
    /// Event emitted when the rule settles
    pub event: Event,
    pub(crate) on_success: Option<Arc<dyn EventHandler>>,
    pub(crate) on_failure: Option<Arc<dyn EventHandler>>,
}

impl Rule {
    /// Create a rule; fails if the condition root or event is invalid
    pub fn new(conditions: Condition, event: Event) -> crate::error::Result<Self> {
        let rule = Self {
            name: None,
            priority: 1,
            conditions,
            event,
            on_success: None,
            on_failure: None,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Parse a rule from its JSON representation
    pub fn from_json(input: &str) -> crate::error::Result<Self> {
        let json: Json = serde_json::from_str(input).map_err(CoreError::from)?;
        Self::from_value(&json)
    }

    /// Parse a rule from a JSON value
    pub fn from_value(json: &Json) -> crate::error::Result<Self> {
        let map = json
            .as_object()
            .ok_or_else(|| CoreError::InvalidRule("rule must be a JSON object".to_string()))?;

        let conditions = map
            .get("conditions")
            .ok_or_else(|| CoreError::InvalidRule("rule requires 'conditions'".to_string()))?;
        let conditions = Condition::from_value(conditions)?;

        let event = map
            .get("event")
            .ok_or_else(|| CoreError::InvalidRule("rule requires 'event'".to_string()))?;
        let event: Event = serde_json::from_value(event.clone())
            .map_err(|e| CoreError::InvalidRule(format!("invalid event: {e}")))?;

        let priority = match map.get("priority") {
            None => 1,
            Some(Json::Number(n)) => match n.as_u64() {
                Some(p) if p >= 1 && p <= u32::MAX as u64 => p as u32,
                _ => {
                    return Err(CoreError::InvalidRule(
                        "'priority' must be a positive integer".to_string(),
                    )
                    .into())
                }
            },
            Some(_) => {
                return Err(CoreError::InvalidRule(
                    "'priority' must be a positive integer".to_string(),
                )
                .into())
            }
        };

        let name = match map.get("name") {
            None | Some(Json::Null) => None,
            Some(Json::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(CoreError::InvalidRule("'name' must be a string".to_string()).into())
            }
        };

        let mut rule = Self::new(conditions, event)?;
        rule.priority = priority;
        rule.name = name;
        Ok(rule)
    }

    /// Serialize the rule to JSON
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self).map_err(CoreError::from)?)
    }

    /// Check the rule's structural invariants
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.conditions.is_boolean_root() {
            return Err(CoreError::InvalidCondition(
                "rule conditions must root at 'all', 'any', 'not' or 'condition'".to_string(),
            )
            .into());
        }
        if self.event.event_type.is_empty() {
            return Err(CoreError::InvalidRule("event requires a 'type'".to_string()).into());
        }
        if self.priority < 1 {
            return Err(CoreError::InvalidRule("priority must be >= 1".to_string()).into());
        }
        if matches!(&self.name, Some(name) if name.is_empty()) {
            return Err(CoreError::InvalidRule("name must not be empty".to_string()).into());
        }
        Ok(())
    }

    /// Set the rule name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the scheduling priority
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Attach a handler invoked when this rule passes, before engine-wide
    /// subscribers
    pub fn on_success(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.on_success = Some(handler);
        self
    }

    /// Attach a handler invoked when this rule fails, before engine-wide
    /// subscribers
    pub fn on_failure(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.on_failure = Some(handler);
        self
    }

    /// Copy of the rule without runtime handlers, for isolated evaluation
    pub(crate) fn without_handlers(&self) -> Self {
        Self {
            name: self.name.clone(),
            priority: self.priority,
            conditions: self.conditions.clone(),
            event: self.event.clone(),
            on_success: None,
            on_failure: None,
        }
    }

    /// Emit this rule's own handler for the given outcome, if any
    pub(crate) async fn emit(
        &self,
        result: &RuleResult,
        almanac: &crate::almanac::Almanac,
    ) -> crate::error::Result<()> {
        let handler = if result.result {
            &self.on_success
        } else {
            &self.on_failure
        };
        if let Some(handler) = handler {
            handler.handle(&result.event, almanac, result).await?;
        }
        Ok(())
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let field_count = if self.name.is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("Rule", field_count)?;
        if let Some(name) = &self.name {
            state.serialize_field("name", name)?;
        }
        state.serialize_field("priority", &self.priority)?;
        state.serialize_field("conditions", &self.conditions)?;
        state.serialize_field("event", &self.event)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        Rule::from_value(&json).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.priority == other.priority
            && self.conditions == other.conditions
            && self.event == other.event
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("event", &self.event.event_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUL_RULE: &str = r#"{
        "name": "foulOut",
        "priority": 2,
        "conditions": {
            "any": [
                { "all": [
                    { "fact": "gameDuration", "operator": "equal", "value": 40 },
                    { "fact": "personalFoulCount", "operator": "greaterThanInclusive", "value": 5 }
                ]},
                { "all": [
                    { "fact": "gameDuration", "operator": "equal", "value": 48 },
                    { "not": { "fact": "personalFoulCount", "operator": "lessThan", "value": 6 } }
                ]}
            ]
        },
        "event": { "type": "fouledOut", "params": { "reason": "too many fouls" } }
    }"#;

    #[test]
    fn test_from_json() {
        let rule = Rule::from_json(FOUL_RULE).unwrap();
        assert_eq!(rule.name.as_deref(), Some("foulOut"));
        assert_eq!(rule.priority, 2);
        assert_eq!(rule.event.event_type, "fouledOut");
    }

    #[test]
    fn test_round_trip_preserves_rule() {
        let rule = Rule::from_json(FOUL_RULE).unwrap();
        let json = rule.to_json().unwrap();
        let back = Rule::from_json(&json).unwrap();
        assert_eq!(rule, back);
    }

    #[test]
    fn test_reject_leaf_root() {
        let err = Rule::from_json(
            r#"{
                "conditions": { "fact": "a", "operator": "equal", "value": 1 },
                "event": { "type": "x" }
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must root at"));
    }

    #[test]
    fn test_reject_zero_priority() {
        let err = Rule::from_json(
            r#"{
                "priority": 0,
                "conditions": { "all": [] },
                "event": { "type": "x" }
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("positive integer"));
    }

    #[test]
    fn test_reject_event_without_type() {
        let err = Rule::from_json(
            r#"{
                "conditions": { "all": [] },
                "event": { "type": "" }
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn test_builder_style_construction() {
        let conditions = Condition::from_json(r#"{ "all": [] }"#).unwrap();
        let rule = Rule::new(conditions, Event::new("always"))
            .unwrap()
            .with_name("trivial")
            .with_priority(9);
        assert_eq!(rule.name.as_deref(), Some("trivial"));
        assert_eq!(rule.priority, 9);
    }
}
