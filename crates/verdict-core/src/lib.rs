//! Verdict Core - Core types for the Verdict rules engine
//!
//! This crate provides the fundamental types shared across the Verdict
//! ecosystem:
//! - `Value` runtime type for facts and thresholds
//! - Condition trees (`all`/`any`/`not`/references/leaves)
//! - Events attached to rules
//! - Operators, decorators and the operator registry
//! - Core error types

pub mod condition;
pub mod error;
pub mod event;
pub mod operator;
pub mod types;

// Re-export commonly used types
pub use condition::{
    AllCondition, AnyCondition, Condition, FactReference, LeafCondition, NodeProps, NotCondition,
    ReferenceCondition, ValueOrRef,
};
pub use error::{CoreError, Result};
pub use event::Event;
pub use operator::{Operator, OperatorDecorator, OperatorRegistry};
pub use types::{FactParams, Value};
