//! Error types for the Verdict engine

use thiserror::Error;
use verdict_core::CoreError;

/// Engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    /// A rule consulted a fact that is not registered with the almanac
    #[error("Undefined fact: {0}")]
    UndefinedFact(String),

    /// A condition reference names a condition the engine does not know
    #[error("Unknown condition: {0}")]
    UnknownCondition(String),

    /// A dynamic fact computation failed
    #[error("Fact computation failed: {0}")]
    Fact(String),

    /// An event handler failed; the run is rejected
    #[error("Event handler failed: {0}")]
    Handler(String),

    /// Core error (invalid rules/conditions, operator resolution)
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_fact_display() {
        let error = EngineError::UndefinedFact("accountBalance".to_string());
        assert_eq!(error.to_string(), "Undefined fact: accountBalance");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let error: EngineError = CoreError::UnknownOperator("almost".to_string()).into();
        assert_eq!(error.to_string(), "Unknown operator: almost");
    }
}
