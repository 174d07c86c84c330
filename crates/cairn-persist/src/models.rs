use cairn_llm::{validate_history, Turn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Persisted conversation: `{ messages, savedAt }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub messages: Vec<Turn>,

    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Snapshot of `messages` taken now
    pub fn new(messages: Vec<Turn>) -> Self {
        Self {
            messages,
            saved_at: Utc::now(),
        }
    }

    /// Messages, rejected if the tool pairing rule is broken
    pub fn into_validated_messages(self) -> Result<Vec<Turn>> {
        validate_history(&self.messages)?;
        Ok(self.messages)
    }
}
