//! Facts: named inputs consulted by rules
//!
//! A fact is either a constant value or a dynamic computation receiving the
//! leaf's params and the almanac. Dynamic facts must be deterministic within
//! one almanac for identical params; the memoization cache relies on it.

use crate::almanac::Almanac;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use verdict_core::{FactParams, Value};

/// A dynamic fact computation.
///
/// Implementations may consult other facts through the almanac; the boxed
/// future breaks the recursion so nested `fact_value` calls stay legal.
#[async_trait]
pub trait DynamicFact: Send + Sync {
    async fn compute(&self, params: &FactParams, almanac: &Almanac) -> Result<Value>;
}

/// Where a fact's value comes from
#[derive(Clone)]
pub enum FactSource {
    /// Fixed value supplied up front
    Constant(Value),
    /// Computed on demand
    Dynamic(Arc<dyn DynamicFact>),
}

/// A named input value, constant or computed
#[derive(Clone)]
pub struct Fact {
    id: String,
    source: FactSource,
    cache: bool,
    priority: u32,
}

impl Fact {
    /// Create a constant fact
    pub fn constant(id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            source: FactSource::Constant(value.into()),
            cache: true,
            priority: 1,
        }
    }

    /// Create a dynamic fact from a synchronous closure over the params
    pub fn computed<F>(id: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&FactParams) -> Value + Send + Sync + 'static,
    {
        struct Closure<F>(F);

        #[async_trait]
        impl<F> DynamicFact for Closure<F>
        where
            F: Fn(&FactParams) -> Value + Send + Sync,
        {
            async fn compute(&self, params: &FactParams, _almanac: &Almanac) -> Result<Value> {
                Ok((self.0)(params))
            }
        }

        Self::dynamic(id, Arc::new(Closure(compute)))
    }

    /// Create a dynamic fact from a full computation
    pub fn dynamic(id: impl Into<String>, computation: Arc<dyn DynamicFact>) -> Self {
        Self {
            id: id.into(),
            source: FactSource::Dynamic(computation),
            cache: true,
            priority: 1,
        }
    }

    /// Disable or enable memoization for this fact (default enabled)
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Evaluation ordering hint, highest first (minimum 1, default 1)
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority.max(1);
        self
    }

    /// Fact identity
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Registered priority
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Whether dynamic results are memoized
    pub fn cache_enabled(&self) -> bool {
        self.cache
    }

    pub(crate) fn source(&self) -> &FactSource {
        &self.source
    }

    /// Memoization key for this fact under `params`.
    ///
    /// Params are a `BTreeMap`, so the serialized form is canonical.
    pub(crate) fn cache_key(&self, params: &FactParams) -> String {
        let params_repr = serde_json::to_string(params).unwrap_or_default();
        format!("{}::{}", self.id, params_repr)
    }
}

impl fmt::Debug for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.source {
            FactSource::Constant(_) => "constant",
            FactSource::Dynamic(_) => "dynamic",
        };
        f.debug_struct("Fact")
            .field("id", &self.id)
            .field("kind", &kind)
            .field("cache", &self.cache)
            .field("priority", &self.priority)
            .finish()
    }
}
