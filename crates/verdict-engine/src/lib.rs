//! Verdict Engine - weighted-scoring rules engine
//!
//! Evaluates declarative JSON rules against a set of facts, producing for
//! each rule a score in `[0,1]`, a boolean verdict (score ≥ 1) and an
//! annotated result tree explaining how each leaf contributed:
//! - Almanac: per-run fact store with parameter-keyed memoization
//! - Condition evaluator: weighted `all`/`any`/`not` scoring algebra
//! - Rule engine: priority-bucketed concurrent evaluation, event emission
//! - Validation engine: partial-satisfaction classification with
//!   missing-fact default synthesis
//!
//! ```no_run
//! use std::collections::HashMap;
//! use verdict_engine::{Engine, Rule, Value};
//!
//! # async fn demo() -> verdict_engine::Result<()> {
//! let mut engine = Engine::new();
//! engine.add_rule(Rule::from_json(
//!     r#"{
//!         "conditions": { "all": [
//!             { "fact": "temperature", "operator": "greaterThan", "value": 100 }
//!         ]},
//!         "event": { "type": "overheated" }
//!     }"#,
//! )?)?;
//!
//! let mut facts = HashMap::new();
//! facts.insert("temperature".to_string(), Value::Number(110.0));
//! let outcome = engine.run(facts).await?;
//! assert_eq!(outcome.events[0].event_type, "overheated");
//! # Ok(())
//! # }
//! ```

pub mod almanac;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod fact;
pub mod path;
pub mod result;
pub mod rule;
pub mod validation;

mod evaluator;

pub use almanac::{Almanac, EventOutcome};
pub use builder::EngineBuilder;
pub use config::EngineOptions;
pub use engine::{Engine, EngineStatus};
pub use error::{EngineError, Result};
pub use events::{handler_fn, EventHandler};
pub use fact::{DynamicFact, Fact, FactSource};
pub use path::{default_path_resolver, resolve_path, PathResolver};
pub use result::{Annotation, ConditionResult, RuleResult, RunOutcome};
pub use rule::Rule;
pub use validation::{
    Classification, ClassificationReason, ClassificationSummary, DefaultValueProvider,
    RuleClassification, SatisfactionType, ValidationEngine,
};

// Core types re-exported for downstream convenience
pub use verdict_core::{
    Condition, CoreError, Event, FactParams, Operator, OperatorDecorator, OperatorRegistry, Value,
    ValueOrRef,
};
