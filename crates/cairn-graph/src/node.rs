use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::LoopError;
use crate::types::{ConversationState, LoopEvent, LoopPhase};

pub type EventSender = mpsc::Sender<LoopEvent>;

/// One step of the loop: a model request or a round of tool calls
#[async_trait]
pub trait Node: Send + Sync {
    /// Run the step, appending to `state` and emitting events through `ctx`
    async fn execute(&self, state: &mut ConversationState, ctx: &RunContext)
        -> Result<(), LoopError>;

    fn node_type(&self) -> NodeType;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    LLM,
    Tool,
}

/// Per-run handles shared by every node
#[derive(Clone)]
pub struct RunContext {
    pub run_id: String,
    events: EventSender,
    cancel: CancellationToken,
    phase: Arc<watch::Sender<LoopPhase>>,
}

impl RunContext {
    pub fn new(
        run_id: impl Into<String>,
        events: EventSender,
        cancel: CancellationToken,
        phase: Arc<watch::Sender<LoopPhase>>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            events,
            cancel,
            phase,
        }
    }

    /// Send an event; a dropped receiver only means nobody is watching
    pub async fn emit(&self, event: LoopEvent) {
        if self.events.send(event).await.is_err() {
            trace!(run_id = %self.run_id, "event receiver dropped");
        }
    }

    pub async fn set_phase(&self, phase: LoopPhase) {
        self.phase.send_replace(phase);
        self.emit(LoopEvent::Phase { phase }).await;
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
