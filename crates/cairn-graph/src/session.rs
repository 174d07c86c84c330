use std::sync::Arc;

use cairn_llm::Turn;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::conversation::Conversation;
use crate::error::{SessionError, SubmitError};
use crate::types::{LoopEvent, LoopPhase, RunOutcome};

const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Shared handle to a conversation that runs submissions in the background.
///
/// A second submission while one is active fails with [`SubmitError::Busy`].
#[derive(Clone)]
pub struct AgentSession {
    inner: Arc<Mutex<Conversation>>,
    phase: watch::Receiver<LoopPhase>,
}

/// A submission running in the background
pub struct RunHandle {
    pub events: mpsc::Receiver<LoopEvent>,
    pub cancel: CancellationToken,
    pub join: JoinHandle<Result<RunOutcome, SubmitError>>,
}

impl RunHandle {
    /// Abort the in-flight request or tool round
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl AgentSession {
    pub fn new(conversation: Conversation) -> Self {
        let phase = conversation.subscribe();
        Self {
            inner: Arc::new(Mutex::new(conversation)),
            phase,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoopPhase> {
        self.phase.clone()
    }

    /// Spawn a run for `text`
    pub fn spawn_submit(&self, text: impl Into<String>) -> Result<RunHandle, SubmitError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SubmitError::EmptyInput);
        }

        let mut conversation = Arc::clone(&self.inner)
            .try_lock_owned()
            .map_err(|_| SubmitError::Busy)?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let run_cancel = cancel.clone();

        let join = tokio::spawn(async move { conversation.submit(&text, tx, run_cancel).await });

        Ok(RunHandle {
            events: rx,
            cancel,
            join,
        })
    }

    /// Snapshot of the history; fails while a run is active
    pub fn history(&self) -> Result<Vec<Turn>, SessionError> {
        let conversation = self.inner.try_lock().map_err(|_| SessionError::Busy)?;
        Ok(conversation.history().to_vec())
    }

    pub async fn restore(&self) -> Result<usize, SessionError> {
        let mut conversation = self.inner.try_lock().map_err(|_| SessionError::Busy)?;
        conversation.restore().await
    }

    pub async fn clear(&self) -> Result<(), SessionError> {
        let mut conversation = self.inner.try_lock().map_err(|_| SessionError::Busy)?;
        conversation.clear().await
    }
}
