//! Fact value projection
//!
//! Leaves and fact references may carry a `path` that projects the resolved
//! value before comparison. The default resolver implements a small
//! JSONPath-like dialect (optional `$` root, `.key` segments, `[index]`
//! array access); callers can install any pure resolver through
//! [`EngineOptions::with_path_resolver`](crate::config::EngineOptions::with_path_resolver).

use std::sync::Arc;
use verdict_core::Value;

/// Pure projection callback: `(value, path) -> projected value`
pub type PathResolver = Arc<dyn Fn(&Value, &str) -> Value + Send + Sync>;

/// The default JSONPath-like resolver
pub fn default_path_resolver() -> PathResolver {
    Arc::new(resolve_path)
}

/// Resolve `path` against `value`; unresolvable segments yield `Value::Null`
pub fn resolve_path(value: &Value, path: &str) -> Value {
    let mut current = value;

    for part in path.trim().trim_start_matches('$').split('.') {
        if part.is_empty() {
            continue;
        }
        let mut pieces = part.split('[');

        let key = pieces.next().unwrap_or_default();
        if !key.is_empty() {
            match current.as_object().and_then(|map| map.get(key)) {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }

        for piece in pieces {
            let index: usize = match piece.trim_end_matches(']').parse() {
                Ok(index) => index,
                Err(_) => return Value::Null,
            };
            match current.as_array().and_then(|items| items.get(index)) {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }
    }

    current.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        serde_json::json!({
            "account": {
                "tier": "gold",
                "owners": ["ada", "grace"],
                "limits": [{ "kind": "daily", "amount": 500 }]
            }
        })
        .into()
    }

    #[test]
    fn test_resolve_nested_keys() {
        assert_eq!(
            resolve_path(&sample(), "$.account.tier"),
            Value::String("gold".to_string())
        );
        assert_eq!(
            resolve_path(&sample(), "account.tier"),
            Value::String("gold".to_string())
        );
    }

    #[test]
    fn test_resolve_array_index() {
        assert_eq!(
            resolve_path(&sample(), "$.account.owners[1]"),
            Value::String("grace".to_string())
        );
        assert_eq!(
            resolve_path(&sample(), "$.account.limits[0].amount"),
            Value::Number(500.0)
        );
    }

    #[test]
    fn test_unresolvable_path_yields_null() {
        assert!(resolve_path(&sample(), "$.account.missing").is_null());
        assert!(resolve_path(&sample(), "$.account.owners[9]").is_null());
        assert!(resolve_path(&sample(), "$.account.owners[x]").is_null());
    }

    #[test]
    fn test_root_array_index() {
        let value: Value = serde_json::json!([10, 20]).into();
        assert_eq!(resolve_path(&value, "$[1]"), Value::Number(20.0));
    }
}
