use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most recent ambient errors kept for a tool window
pub const DIAGNOSTICS_CAPACITY: usize = 8;

/// One ambient error event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    pub at: DateTime<Utc>,
}

impl DiagnosticEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            at: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Injectable sink for ambient error events.
///
/// Anything in the process may push; the tool orchestrator drains it
/// around each tool call. Pushing is synchronous so it can be called
/// from a logging layer.
pub trait DiagnosticsSink: Send + Sync {
    fn push(&self, entry: DiagnosticEntry);

    /// Remove and return everything recorded so far, oldest first
    fn drain(&self) -> Vec<DiagnosticEntry>;
}

/// Bounded ring buffer, keeps the newest [`DIAGNOSTICS_CAPACITY`] entries
pub struct RingDiagnostics {
    entries: Mutex<VecDeque<DiagnosticEntry>>,
    capacity: usize,
}

impl RingDiagnostics {
    pub fn new() -> Self {
        Self::with_capacity(DIAGNOSTICS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<DiagnosticEntry>> {
        // a panicking pusher cannot leave the deque half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RingDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsSink for RingDiagnostics {
    fn push(&self, entry: DiagnosticEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    fn drain(&self) -> Vec<DiagnosticEntry> {
        self.lock().drain(..).collect()
    }
}
