use std::sync::Arc;
use std::time::Instant;

use cairn_llm::{HistoryError, Turn};
use cairn_persist::{SessionSnapshot, SessionStore};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{SessionError, SubmitError};
use crate::graph::Graph;
use crate::node::{EventSender, RunContext};
use crate::nodes::append_turn;
use crate::types::{ConversationState, LoopEvent, LoopPhase, RunOutcome};

/// One conversation: its history, its loop phase and where it is saved.
///
/// Only `submit` appends to the history, so at most one loop runs per
/// conversation.
pub struct Conversation {
    graph: Arc<Graph>,
    state: ConversationState,
    phase: Arc<watch::Sender<LoopPhase>>,
    store: Option<Arc<dyn SessionStore>>,
}

impl Conversation {
    pub fn new(graph: Arc<Graph>) -> Self {
        let (phase, _) = watch::channel(LoopPhase::Idle);
        Self {
            graph,
            state: ConversationState::new(),
            phase: Arc::new(phase),
            store: None,
        }
    }

    /// Save a snapshot through `store` after every run
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn phase(&self) -> LoopPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoopPhase> {
        self.phase.subscribe()
    }

    pub fn history(&self) -> &[Turn] {
        self.state.turns()
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Replace the history, rejecting broken tool pairing
    pub fn hydrate(&mut self, turns: Vec<Turn>) -> Result<(), HistoryError> {
        self.state = ConversationState::from_turns(turns)?;
        Ok(())
    }

    /// Hydrate from the session store. Returns the number of restored turns.
    pub async fn restore(&mut self) -> Result<usize, SessionError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let Some(snapshot) = store.load().await? else {
            return Ok(0);
        };

        let saved_at = snapshot.saved_at;
        let turns = snapshot.into_validated_messages()?;
        self.hydrate(turns)?;

        info!(turns = self.state.len(), %saved_at, "session restored");
        Ok(self.state.len())
    }

    /// Forget the history and the saved session
    pub async fn clear(&mut self) -> Result<(), SessionError> {
        self.state.clear();
        if let Some(store) = &self.store {
            store.clear().await?;
        }
        info!("conversation cleared");
        Ok(())
    }

    /// Append `text` as a user turn and run the loop to completion.
    ///
    /// Cancellation and failures are outcomes, not errors; the conversation
    /// is idle again when this returns.
    pub async fn submit(
        &mut self,
        text: &str,
        events: EventSender,
        cancel: CancellationToken,
    ) -> Result<RunOutcome, SubmitError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitError::EmptyInput);
        }
        if !self.phase().is_idle() {
            return Err(SubmitError::Busy);
        }

        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let ctx = RunContext::new(run_id.clone(), events, cancel, Arc::clone(&self.phase));
        let _guard = PhaseGuard(Arc::clone(&self.phase));

        ctx.emit(LoopEvent::InitStream {
            run_id: run_id.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
        .await;
        info!(run_id = %run_id, turns = self.state.len(), "run started");

        append_turn(&mut self.state, &ctx, Turn::user(text)).await;

        let outcome = match self.graph.run(&mut self.state, &ctx).await {
            Ok(()) => RunOutcome::Completed,
            Err(e) if e.is_cancelled() => {
                info!(run_id = %run_id, "run cancelled");
                ctx.set_phase(LoopPhase::Cancelled).await;
                RunOutcome::Cancelled
            }
            Err(e) => {
                let message = e.to_string();
                warn!(run_id = %run_id, error = %message, "run failed");
                ctx.set_phase(LoopPhase::Failed).await;
                ctx.emit(LoopEvent::Error {
                    message: message.clone(),
                })
                .await;
                RunOutcome::Failed { message }
            }
        };

        ctx.set_phase(LoopPhase::Idle).await;

        let total_duration_ms = start.elapsed().as_millis() as u64;
        info!(run_id = %run_id, status = outcome.status(), total_duration_ms, "run finished");
        ctx.emit(LoopEvent::EndStream {
            status: outcome.status().to_string(),
            total_duration_ms,
        })
        .await;

        self.autosave().await;
        Ok(outcome)
    }

    async fn autosave(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = SessionSnapshot::new(self.state.turns().to_vec());
        if let Err(e) = store.save(&snapshot).await {
            error!(error = %e, "failed to save session");
        }
    }
}

/// Returns the phase to idle if a run is dropped mid-flight
struct PhaseGuard(Arc<watch::Sender<LoopPhase>>);

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        self.0.send_replace(LoopPhase::Idle);
    }
}
