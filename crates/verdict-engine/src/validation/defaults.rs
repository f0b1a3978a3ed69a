//! Missing-fact default synthesis
//!
//! Given a leaf whose fact is absent from the provided set, synthesize the
//! value that fact would need to satisfy that leaf. Callers can override the
//! built-in table per operator with a [`DefaultValueProvider`]; providers and
//! the table are keyed by the base operator, so decorator-chained names like
//! `not:greaterThan` resolve the same way the registry resolves them.

use std::sync::Arc;
use verdict_core::{LeafCondition, Value};

/// Custom synthesis callback: `(threshold, leaf) -> satisfying value`
pub type DefaultValueProvider = Arc<dyn Fn(&Value, &LeafCondition) -> Value + Send + Sync>;

const LAST_MINUTE: u32 = 23 * 60 + 59;

/// Base operator of a possibly `:`-chained name, mirroring the registry's
/// suffix resolution
pub(crate) fn base_operator(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Built-in synthesis table, keyed by the base operator
pub(crate) fn default_for_operator(operator: &str, threshold: &Value) -> Value {
    match base_operator(operator) {
        "equal" => threshold.clone(),
        "notEqual" => match threshold {
            Value::String(s) => Value::String(format!("{s}_different")),
            Value::Number(n) => Value::Number(n + 1.0),
            other => other.clone(),
        },
        "greaterThan" => match threshold {
            Value::Number(n) => Value::Number(n + 1.0),
            Value::String(s) => match parse_hhmm(s) {
                Some(minutes) => Value::String(format_hhmm((minutes + 30).min(LAST_MINUTE))),
                None => Value::String(format!("{s}1")),
            },
            other => other.clone(),
        },
        "lessThan" => match threshold {
            Value::Number(n) => Value::Number(n - 1.0),
            Value::String(s) => match parse_hhmm(s) {
                Some(minutes) => Value::String(format_hhmm(minutes.saturating_sub(30))),
                None => {
                    let mut shorter = s.clone();
                    shorter.pop();
                    Value::String(shorter)
                }
            },
            other => other.clone(),
        },
        "greaterThanInclusive" | "lessThanInclusive" => threshold.clone(),
        "in" | "contains" | "includes" => match threshold.as_array() {
            Some(items) if !items.is_empty() => items[0].clone(),
            _ => threshold.clone(),
        },
        _ => threshold.clone(),
    }
}

/// Parse an `HH:MM` clock string into minutes since midnight
fn parse_hhmm(text: &str) -> Option<u32> {
    let (hours, minutes) = text.split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn format_hhmm(total: u32) -> String {
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn text(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn test_equal_and_inclusive_use_threshold() {
        assert_eq!(default_for_operator("equal", &num(99.0)), num(99.0));
        assert_eq!(
            default_for_operator("greaterThanInclusive", &num(5.0)),
            num(5.0)
        );
        assert_eq!(
            default_for_operator("lessThanInclusive", &text("x")),
            text("x")
        );
    }

    #[test]
    fn test_not_equal_mutates_value() {
        assert_eq!(
            default_for_operator("notEqual", &text("closed")),
            text("closed_different")
        );
        assert_eq!(default_for_operator("notEqual", &num(7.0)), num(8.0));
        assert_eq!(
            default_for_operator("notEqual", &Value::Bool(true)),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_numeric_comparisons_step_past_threshold() {
        assert_eq!(default_for_operator("greaterThan", &num(80.0)), num(81.0));
        assert_eq!(default_for_operator("lessThan", &num(80.0)), num(79.0));
    }

    #[test]
    fn test_clock_strings_shift_by_half_hour() {
        assert_eq!(
            default_for_operator("greaterThan", &text("09:15")),
            text("09:45")
        );
        assert_eq!(
            default_for_operator("lessThan", &text("09:15")),
            text("08:45")
        );
        // Shifts clamp to the day's bounds
        assert_eq!(
            default_for_operator("lessThan", &text("00:10")),
            text("00:00")
        );
        assert_eq!(
            default_for_operator("greaterThan", &text("23:45")),
            text("23:59")
        );
    }

    #[test]
    fn test_plain_strings_mutate_lexically() {
        assert_eq!(
            default_for_operator("greaterThan", &text("beta")),
            text("beta1")
        );
        assert_eq!(default_for_operator("lessThan", &text("beta")), text("bet"));
    }

    #[test]
    fn test_membership_takes_first_element() {
        let options = Value::Array(vec![text("a"), text("b")]);
        assert_eq!(default_for_operator("in", &options), text("a"));
        assert_eq!(default_for_operator("contains", &options), text("a"));
        assert_eq!(default_for_operator("includes", &options), text("a"));
        assert_eq!(
            default_for_operator("in", &Value::Array(vec![])),
            Value::Array(vec![])
        );
        assert_eq!(default_for_operator("in", &text("solo")), text("solo"));
    }

    #[test]
    fn test_unknown_operator_passes_threshold_through() {
        assert_eq!(
            default_for_operator("startsWith", &text("pre")),
            text("pre")
        );
    }

    #[test]
    fn test_chained_names_resolve_against_base_operator() {
        assert_eq!(base_operator("greaterThan"), "greaterThan");
        assert_eq!(base_operator("not:greaterThan"), "greaterThan");
        assert_eq!(base_operator("not:everyFact:lessThan"), "lessThan");

        assert_eq!(
            default_for_operator("not:greaterThan", &num(80.0)),
            num(81.0)
        );
        assert_eq!(
            default_for_operator("everyFact:lessThan", &num(80.0)),
            num(79.0)
        );
        assert_eq!(
            default_for_operator("swap:notEqual", &text("closed")),
            text("closed_different")
        );
    }

    #[test]
    fn test_hhmm_parsing_is_strict() {
        assert_eq!(parse_hhmm("09:15"), Some(9 * 60 + 15));
        assert_eq!(parse_hhmm("9:15"), Some(9 * 60 + 15));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("09:75"), None);
        assert_eq!(parse_hhmm("0915"), None);
        assert_eq!(parse_hhmm("ab:cd"), None);
    }
}
