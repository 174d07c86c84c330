use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Model requests allowed per submission
    pub max_iterations: usize,

    /// Wait after each tool dispatch before collecting ambient errors.
    /// Zero means a single scheduler yield.
    pub settle_delay: Duration,

    /// Minimum spacing of live text updates
    pub coalesce_window: Duration,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            settle_delay: Duration::ZERO,
            coalesce_window: Duration::from_millis(16),
        }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_coalesce_window(mut self, window: Duration) -> Self {
        self.coalesce_window = window;
        self
    }
}
