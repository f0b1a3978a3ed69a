//! Engine configuration

use crate::path::{default_path_resolver, PathResolver};
use std::fmt;
use verdict_core::Value;

/// Engine configuration flags and hooks
#[derive(Clone)]
pub struct EngineOptions {
    /// Missing facts resolve to null instead of rejecting the run
    pub allow_undefined_facts: bool,

    /// Missing named conditions score 0 instead of rejecting the run
    pub allow_undefined_conditions: bool,

    /// Resolve `{ "fact": ... }` references in event params before emission
    pub replace_facts_in_event_params: bool,

    /// Projection applied when a leaf or fact reference carries a `path`
    pub path_resolver: PathResolver,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self {
            allow_undefined_facts: false,
            allow_undefined_conditions: false,
            replace_facts_in_event_params: false,
            path_resolver: default_path_resolver(),
        }
    }

    /// Missing facts resolve to null instead of rejecting the run
    pub fn allow_undefined_facts(mut self, allow: bool) -> Self {
        self.allow_undefined_facts = allow;
        self
    }

    /// Missing named conditions score 0 instead of rejecting the run
    pub fn allow_undefined_conditions(mut self, allow: bool) -> Self {
        self.allow_undefined_conditions = allow;
        self
    }

    /// Resolve fact references in event params before emission
    pub fn replace_facts_in_event_params(mut self, replace: bool) -> Self {
        self.replace_facts_in_event_params = replace;
        self
    }

    /// Install a custom path resolver
    pub fn with_path_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&Value, &str) -> Value + Send + Sync + 'static,
    {
        self.path_resolver = std::sync::Arc::new(resolver);
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("allow_undefined_facts", &self.allow_undefined_facts)
            .field("allow_undefined_conditions", &self.allow_undefined_conditions)
            .field(
                "replace_facts_in_event_params",
                &self.replace_facts_in_event_params,
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert!(!options.allow_undefined_facts);
        assert!(!options.allow_undefined_conditions);
        assert!(!options.replace_facts_in_event_params);
    }

    #[test]
    fn test_builder_flags() {
        let options = EngineOptions::new()
            .allow_undefined_facts(true)
            .replace_facts_in_event_params(true);
        assert!(options.allow_undefined_facts);
        assert!(options.replace_facts_in_event_params);
        assert!(!options.allow_undefined_conditions);
    }

    #[test]
    fn test_custom_path_resolver() {
        let options =
            EngineOptions::new().with_path_resolver(|_, _| Value::String("fixed".to_string()));
        let projected = (options.path_resolver)(&Value::Null, "$.anything");
        assert_eq!(projected, Value::String("fixed".to_string()));
    }
}
