use cairn_llm::{HistoryError, LlmError};
use cairn_persist::PersistError;
use thiserror::Error;

/// Why a run stopped before the model finished
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Llm(LlmError),

    /// In-band `error` event sent by the backend mid-stream
    #[error("provider error: {0}")]
    Provider(String),

    #[error("max iterations ({0}) reached")]
    MaxIterations(usize),

    #[error("invalid history: {0}")]
    InvalidHistory(#[from] HistoryError),
}

impl LoopError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<LlmError> for LoopError {
    fn from(err: LlmError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Llm(err)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("a run is already active for this conversation")]
    Busy,

    #[error("input is empty")]
    EmptyInput,
}

/// Failures of session management (restore, clear)
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a run is already active for this conversation")]
    Busy,

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("saved session rejected: {0}")]
    InvalidHistory(#[from] HistoryError),
}
