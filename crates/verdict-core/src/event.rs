//! Events attached to rules
//!
//! A rule carries exactly one event; the engine emits it on success or
//! failure together with the rule's result. Event params may embed fact
//! references (the same `{ "fact": ... }` shape as leaf values), which the
//! engine can resolve against the almanac before emission.

use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Event emitted when a rule settles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type; doubles as the engine subscription name
    #[serde(rename = "type")]
    pub event_type: String,

    /// Optional payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<HashMap<String, Value>>,
}

impl Event {
    /// Create an event with no params
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            params: None,
        }
    }

    /// Attach a param
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = Event::new("fouledOut")
            .with_param("player", "mike")
            .with_param("fouls", 6i64);

        assert_eq!(event.event_type, "fouledOut");
        let params = event.params.as_ref().unwrap();
        assert_eq!(params.get("player"), Some(&Value::String("mike".to_string())));
        assert_eq!(params.get("fouls"), Some(&Value::Number(6.0)));
    }

    #[test]
    fn test_event_serde_uses_type_key() {
        let event = Event::new("alert");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"alert"}"#);

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
