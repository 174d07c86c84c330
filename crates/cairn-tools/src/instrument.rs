use std::sync::Arc;
use std::time::Duration;

use cairn_llm::ToolDescriptor;
use serde_json::{json, Map, Value};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::diagnostics::{DiagnosticEntry, DiagnosticsSink};
use crate::executor::ToolExecutor;

pub const DURATION_KEY: &str = "_duration_ms";
pub const PAGE_ERRORS_KEY: &str = "_page_errors";

/// Outcome of one instrumented tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    /// Executor output with `_duration_ms` and, when any were captured,
    /// `_page_errors` attached
    pub value: Value,
    pub duration_ms: u64,
    pub page_errors: Vec<DiagnosticEntry>,
}

impl ToolOutcome {
    /// Whether the executor reported an error
    pub fn is_error(&self) -> bool {
        self.value.get("error").is_some()
    }

    /// JSON-encoded value, as stored in a tool result
    pub fn encoded(&self) -> String {
        self.value.to_string()
    }
}

/// Wraps an executor with timing and ambient error capture.
///
/// Every call: drain stale diagnostics, time the dispatch, settle so
/// late errors land, drain again and attach what arrived.
pub struct InstrumentedExecutor {
    inner: Arc<dyn ToolExecutor>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    settle_delay: Duration,
}

impl InstrumentedExecutor {
    pub fn new(inner: Arc<dyn ToolExecutor>, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            inner,
            diagnostics,
            settle_delay: Duration::ZERO,
        }
    }

    /// Zero means a single scheduler yield
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.inner.descriptors()
    }

    pub async fn execute(&self, name: &str, arguments: Value) -> ToolOutcome {
        let stale = self.diagnostics.drain();
        if !stale.is_empty() {
            debug!(count = stale.len(), "discarding diagnostics raised before tool window");
        }

        let start = Instant::now();
        let result = self.inner.execute(name, arguments).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        self.settle().await;
        let page_errors = self.diagnostics.drain();

        info!(
            tool = name,
            duration_ms,
            page_errors = page_errors.len(),
            "tool finished"
        );

        ToolOutcome {
            value: annotate(result, duration_ms, &page_errors),
            duration_ms,
            page_errors,
        }
    }

    async fn settle(&self) {
        if self.settle_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.settle_delay).await;
        }
    }
}

fn annotate(result: Value, duration_ms: u64, page_errors: &[DiagnosticEntry]) -> Value {
    let mut object = match result {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("result".to_string(), other);
            map
        }
    };

    object.insert(DURATION_KEY.to_string(), json!(duration_ms));
    if !page_errors.is_empty() {
        let messages: Vec<&str> = page_errors.iter().map(|e| e.message.as_str()).collect();
        object.insert(PAGE_ERRORS_KEY.to_string(), json!(messages));
    }

    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_object_results_are_wrapped() {
        let value = annotate(json!("plain"), 4, &[]);
        assert_eq!(value, json!({"result": "plain", "_duration_ms": 4}));
    }

    #[test]
    fn test_page_errors_only_when_present() {
        let value = annotate(json!({"ok": true}), 1, &[DiagnosticEntry::new("boom")]);
        assert_eq!(
            value,
            json!({"ok": true, "_duration_ms": 1, "_page_errors": ["boom"]})
        );
    }
}
