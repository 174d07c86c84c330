use std::sync::Arc;

use async_trait::async_trait;
use cairn_llm::{with_cancellation, ModelClient, ModelConfig, Turn};
use cairn_tools::InstrumentedExecutor;
use futures::StreamExt;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::assembler::{AssemblyUpdate, StreamSession};
use crate::coalesce::DeltaCoalescer;
use crate::error::LoopError;
use crate::node::{Node, NodeType, RunContext};
use crate::nodes::append_turn;
use crate::types::{ConversationState, LoopEvent, LoopPhase};

/// Issues one model request and assembles the streamed assistant turn
pub struct LLMNode {
    client: Arc<dyn ModelClient>,
    executor: Arc<InstrumentedExecutor>,
    model: ModelConfig,
    coalesce_window: Duration,
}

impl LLMNode {
    pub fn new(
        client: Arc<dyn ModelClient>,
        executor: Arc<InstrumentedExecutor>,
        model: ModelConfig,
    ) -> Self {
        Self {
            client,
            executor,
            model,
            coalesce_window: Duration::ZERO,
        }
    }

    pub fn with_coalesce_window(mut self, window: Duration) -> Self {
        self.coalesce_window = window;
        self
    }
}

#[async_trait]
impl Node for LLMNode {
    async fn execute(
        &self,
        state: &mut ConversationState,
        ctx: &RunContext,
    ) -> Result<(), LoopError> {
        ctx.set_phase(LoopPhase::Requesting).await;

        let request = self
            .model
            .request(state.turns().to_vec(), self.executor.descriptors());

        let stream = tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => return Err(LoopError::Cancelled),
            result = self.client.stream(request) => result?,
        };

        ctx.set_phase(LoopPhase::StreamingAssistant).await;

        let mut stream = with_cancellation(stream, ctx.cancel_token().clone());
        let mut session = StreamSession::new();
        let mut coalescer = DeltaCoalescer::new(self.coalesce_window);

        loop {
            let deadline = coalescer.deadline();
            let next = tokio::select! {
                item = stream.next() => Some(item),
                _ = sleep_until(deadline) => None,
            };

            let event = match next {
                // a held-back text update became due
                None => {
                    if let Some(update) = coalescer.flush() {
                        emit_text(ctx, update).await;
                    }
                    continue;
                }
                Some(None) => break,
                Some(Some(item)) => item?,
            };

            match session.apply(&event)? {
                Some(AssemblyUpdate::Text { block, text }) => {
                    for update in coalescer.push(block, text) {
                        emit_text(ctx, update).await;
                    }
                }
                Some(AssemblyUpdate::BlockClosed { block }) => {
                    if let Some(update) = coalescer.flush_block(block) {
                        emit_text(ctx, update).await;
                    }
                }
                Some(AssemblyUpdate::ToolStarted { id, name, .. }) => {
                    debug!(run_id = %ctx.run_id, tool_use_id = %id, tool = %name, "tool invocation streaming");
                }
                Some(AssemblyUpdate::MessageStopped { stop_reason }) => {
                    debug!(run_id = %ctx.run_id, stop_reason = ?stop_reason, "message stopped");
                }
                None => {}
            }
        }

        if let Some(update) = coalescer.flush() {
            emit_text(ctx, update).await;
        }

        // the token may fire between the last chunk and here
        if ctx.is_cancelled() {
            return Err(LoopError::Cancelled);
        }

        let stop_reason = session.stop_reason().map(str::to_string);
        let blocks = session.finish();
        if blocks.is_empty() {
            warn!(run_id = %ctx.run_id, stop_reason = ?stop_reason, "model returned an empty turn");
            return Ok(());
        }

        let turn = Turn::assistant(blocks);
        // a reused id could never be answered unambiguously
        if let Some(id) = turn.duplicate_tool_id() {
            warn!(run_id = %ctx.run_id, tool_use_id = %id, "model reused a tool id");
            return Err(LoopError::Provider(format!("duplicate tool id {id}")));
        }

        info!(
            run_id = %ctx.run_id,
            tool_calls = turn.tool_invocations().len(),
            stop_reason = ?stop_reason,
            "assistant turn assembled"
        );
        append_turn(state, ctx, turn).await;

        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::LLM
    }
}

async fn emit_text(ctx: &RunContext, (block_index, text): (usize, String)) {
    ctx.emit(LoopEvent::TextUpdate { block_index, text }).await;
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
