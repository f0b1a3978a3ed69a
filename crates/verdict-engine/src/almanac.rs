//! Almanac: per-run fact environment
//!
//! The almanac owns everything a single run accumulates: the fact table
//! (registered facts layered with runtime facts), the memoization cache for
//! dynamic facts, and the ordered event and result logs. An almanac is
//! created per run and must not be reused across runs.
//!
//! Memoization stores one `OnceCell` per `(fact_id, params)` key, so
//! concurrent lookups of the same dynamic fact share a single in-flight
//! computation.

use crate::config::EngineOptions;
use crate::error::{EngineError, Result};
use crate::fact::{Fact, FactSource};
use crate::path::PathResolver;
use crate::result::RuleResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use verdict_core::{Event, FactParams, Value, ValueOrRef};

/// Which log an event lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Success,
    Failure,
}

/// Per-run fact store, cache and event/result accumulator
pub struct Almanac {
    facts: RwLock<HashMap<String, Fact>>,
    cache: RwLock<HashMap<String, Arc<OnceCell<Value>>>>,
    success_events: Mutex<Vec<Event>>,
    failure_events: Mutex<Vec<Event>>,
    results: Mutex<Vec<RuleResult>>,
    allow_undefined_facts: bool,
    path_resolver: PathResolver,
}

impl Almanac {
    /// Create a fresh almanac for one run
    pub fn new(options: &EngineOptions) -> Self {
        Self {
            facts: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
            success_events: Mutex::new(Vec::new()),
            failure_events: Mutex::new(Vec::new()),
            results: Mutex::new(Vec::new()),
            allow_undefined_facts: options.allow_undefined_facts,
            path_resolver: options.path_resolver.clone(),
        }
    }

    /// Register a fact for this run, replacing any fact with the same id
    pub async fn add_fact(&self, fact: Fact) {
        self.facts.write().await.insert(fact.id().to_string(), fact);
    }

    /// Register a constant runtime fact
    pub async fn add_runtime_value(&self, id: impl Into<String>, value: impl Into<Value>) {
        let id = id.into();
        self.add_fact(Fact::constant(id, value)).await;
    }

    /// Registered priority of a fact, 1 when unknown
    pub(crate) async fn fact_priority(&self, fact_id: &str) -> u32 {
        self.facts
            .read()
            .await
            .get(fact_id)
            .map(Fact::priority)
            .unwrap_or(1)
    }

    /// Resolve a fact to its value.
    ///
    /// Dynamic facts are memoized per `(fact_id, params)` unless the fact
    /// disables caching. A non-empty `path` projects object/array results
    /// through the path resolver; other values pass through unchanged.
    pub async fn fact_value(
        &self,
        fact_id: &str,
        params: &FactParams,
        path: Option<&str>,
    ) -> Result<Value> {
        let fact = self.facts.read().await.get(fact_id).cloned();
        let fact = match fact {
            Some(fact) => fact,
            None if self.allow_undefined_facts => {
                tracing::trace!(fact = fact_id, "undefined fact tolerated");
                return Ok(Value::Null);
            }
            None => return Err(EngineError::UndefinedFact(fact_id.to_string())),
        };

        let resolved = match fact.source() {
            FactSource::Constant(value) => value.clone(),
            FactSource::Dynamic(computation) => {
                if fact.cache_enabled() {
                    let cell = {
                        let mut cache = self.cache.write().await;
                        cache
                            .entry(fact.cache_key(params))
                            .or_insert_with(|| Arc::new(OnceCell::new()))
                            .clone()
                    };
                    cell.get_or_try_init(|| async {
                        tracing::debug!(fact = fact_id, "computing dynamic fact");
                        computation.compute(params, self).await
                    })
                    .await?
                    .clone()
                } else {
                    computation.compute(params, self).await?
                }
            }
        };

        Ok(self.project(resolved, path))
    }

    /// Resolve a leaf value or event param: fact references go through
    /// [`fact_value`](Self::fact_value), literals are returned as-is
    pub async fn get_value(&self, value: &ValueOrRef) -> Result<Value> {
        match value {
            ValueOrRef::Literal(literal) => Ok(literal.clone()),
            ValueOrRef::Fact(reference) => {
                let empty = FactParams::new();
                let params = reference.params.as_ref().unwrap_or(&empty);
                self.fact_value(&reference.fact, params, reference.path.as_deref())
                    .await
            }
        }
    }

    fn project(&self, value: Value, path: Option<&str>) -> Value {
        match path {
            Some(path)
                if !path.is_empty() && matches!(value, Value::Object(_) | Value::Array(_)) =>
            {
                (self.path_resolver)(&value, path)
            }
            _ => value,
        }
    }

    /// Append an event to the success or failure log
    pub async fn add_event(&self, event: Event, outcome: EventOutcome) {
        match outcome {
            EventOutcome::Success => self.success_events.lock().await.push(event),
            EventOutcome::Failure => self.failure_events.lock().await.push(event),
        }
    }

    /// Events of one outcome, in insertion order
    pub async fn events(&self, outcome: EventOutcome) -> Vec<Event> {
        match outcome {
            EventOutcome::Success => self.success_events.lock().await.clone(),
            EventOutcome::Failure => self.failure_events.lock().await.clone(),
        }
    }

    /// All events, successes before failures, each in insertion order
    pub async fn all_events(&self) -> Vec<Event> {
        let mut events = self.events(EventOutcome::Success).await;
        events.extend(self.events(EventOutcome::Failure).await);
        events
    }

    /// Append a rule result
    pub async fn add_result(&self, result: RuleResult) {
        self.results.lock().await.push(result);
    }

    /// Rule results in insertion order
    pub async fn results(&self) -> Vec<RuleResult> {
        self.results.lock().await.clone()
    }
}

impl std::fmt::Debug for Almanac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Almanac")
            .field("allow_undefined_facts", &self.allow_undefined_facts)
            .finish_non_exhaustive()
    }
}
