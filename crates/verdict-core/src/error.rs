//! Error types for Verdict Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// A condition node is structurally invalid
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// A rule is structurally invalid
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Operator resolution failed: the base name is not registered
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Operator resolution failed: a decorator prefix is not registered
    #[error("Unknown decorator: {0}")]
    UnknownDecorator(String),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_condition_display() {
        let error = CoreError::InvalidCondition("leaf is missing 'operator'".to_string());
        assert!(error.to_string().contains("Invalid condition"));
        assert!(error.to_string().contains("missing 'operator'"));
    }

    #[test]
    fn test_unknown_operator_display() {
        let error = CoreError::UnknownOperator("frobnicate".to_string());
        assert_eq!(error.to_string(), "Unknown operator: frobnicate");
    }

    #[test]
    fn test_unknown_decorator_display() {
        let error = CoreError::UnknownDecorator("everyThing".to_string());
        assert_eq!(error.to_string(), "Unknown decorator: everyThing");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: CoreError = json_error.into();
        assert!(error.to_string().contains("Serialization error"));
    }
}
