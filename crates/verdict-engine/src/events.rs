//! Event handler interface
//!
//! The engine exposes a small observer surface: handlers subscribe to
//! `success`, `failure`, or a specific event type, and rules may carry their
//! own handlers. Handlers run sequentially per rule; a returned error
//! rejects the whole run.

use crate::almanac::Almanac;
use crate::error::Result;
use crate::result::RuleResult;
use async_trait::async_trait;
use std::sync::Arc;
use verdict_core::Event;

/// Observer invoked when a rule settles
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &Event, almanac: &Almanac, result: &RuleResult) -> Result<()>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&Event, &Almanac, &RuleResult) -> Result<()> + Send + Sync,
{
    async fn handle(&self, event: &Event, almanac: &Almanac, result: &RuleResult) -> Result<()> {
        (self.0)(event, almanac, result)
    }
}

/// Wrap a synchronous closure as an [`EventHandler`]
pub fn handler_fn<F>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(&Event, &Almanac, &RuleResult) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineOptions;
    use crate::result::{Annotation, ConditionResult, LeafResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use verdict_core::{Value, ValueOrRef};

    fn sample_result() -> RuleResult {
        RuleResult {
            name: None,
            priority: 1,
            event: Event::new("sample"),
            result: true,
            score: 1.0,
            conditions: ConditionResult::Leaf(LeafResult {
                fact: "f".to_string(),
                operator: "equal".to_string(),
                value: ValueOrRef::Literal(Value::Number(1.0)),
                path: None,
                params: None,
                fact_result: Value::Number(1.0),
                value_result: Value::Number(1.0),
                annotation: Annotation {
                    score: 1.0,
                    result: true,
                    weight: 1,
                    name: None,
                },
            }),
        }
    }

    #[tokio::test]
    async fn test_handler_fn_invocation() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let handler = handler_fn(move |event, _, result| {
            assert_eq!(event.event_type, "sample");
            assert!(result.result);
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let almanac = Almanac::new(&EngineOptions::default());
        let result = sample_result();
        handler.handle(&result.event, &almanac, &result).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
