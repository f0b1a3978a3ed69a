//! Condition trees
//!
//! A condition is a recursive tree combining leaf comparisons
//! (`fact` / `operator` / `value`) through `all`, `any` and `not` nodes,
//! plus references to named conditions registered on the engine.

pub mod parser;
pub mod types;

pub use types::{
    AllCondition, AnyCondition, Condition, FactReference, LeafCondition, NodeProps, NotCondition,
    ReferenceCondition, ValueOrRef,
};
