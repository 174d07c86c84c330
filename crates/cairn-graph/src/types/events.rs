use cairn_llm::Turn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a conversation's agentic loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    #[default]
    Idle,
    Requesting,
    StreamingAssistant,
    ExecutingTools,
    Cancelled,
    Failed,
}

impl LoopPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Events emitted while a submission runs, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    /// Run started
    InitStream {
        run_id: String,
        timestamp: i64,
    },

    Phase {
        phase: LoopPhase,
    },

    /// Live text of a block (coalesced, always ends with the final text)
    TextUpdate {
        block_index: usize,
        text: String,
    },

    /// A tool is about to run
    ToolCall {
        id: String,
        name: String,
        arguments: Value,
    },

    /// Tool execution completed
    ToolResult {
        tool_use_id: String,
        name: String,
        content: String,
        is_error: bool,
        duration_ms: u64,
    },

    /// A turn was appended to the history
    TurnAppended {
        index: usize,
        turn: Turn,
    },

    /// Fatal error, reported once
    Error {
        message: String,
    },

    /// Run finished
    EndStream {
        status: String,
        total_duration_ms: u64,
    },
}

/// How a submission ended. Cancellation is not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed { message: String },
}

impl RunOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }
}
