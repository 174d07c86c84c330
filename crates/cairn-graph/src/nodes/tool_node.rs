use std::sync::Arc;

use async_trait::async_trait;
use cairn_llm::{ToolInvocation, ToolResult, Turn};
use cairn_tools::InstrumentedExecutor;
use serde_json::json;
use tracing::{debug, info};

use crate::error::LoopError;
use crate::node::{Node, NodeType, RunContext};
use crate::nodes::append_turn;
use crate::types::{ConversationState, LoopEvent, LoopPhase};

/// Runs the pending tool invocations one after another, in order
pub struct ToolNode {
    executor: Arc<InstrumentedExecutor>,
}

impl ToolNode {
    pub fn new(executor: Arc<InstrumentedExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Node for ToolNode {
    async fn execute(
        &self,
        state: &mut ConversationState,
        ctx: &RunContext,
    ) -> Result<(), LoopError> {
        let invocations = state.pending_tool_invocations();
        if invocations.is_empty() {
            return Ok(());
        }

        ctx.set_phase(LoopPhase::ExecutingTools).await;

        let mut results = Vec::with_capacity(invocations.len());
        for invocation in &invocations {
            ctx.emit(LoopEvent::ToolCall {
                id: invocation.id.clone(),
                name: invocation.name.clone(),
                arguments: invocation.arguments.clone(),
            })
            .await;

            debug!(run_id = %ctx.run_id, tool = %invocation.name, tool_use_id = %invocation.id, "executing tool");

            let outcome = tokio::select! {
                biased;
                _ = ctx.cancel_token().cancelled() => None,
                outcome = self.executor.execute(&invocation.name, invocation.arguments.clone()) => Some(outcome),
            };

            let Some(outcome) = outcome else {
                info!(run_id = %ctx.run_id, tool = %invocation.name, "run cancelled during tool execution");
                append_turn(state, ctx, cancelled_results(&invocations)).await;
                return Err(LoopError::Cancelled);
            };

            let content = outcome.encoded();
            ctx.emit(LoopEvent::ToolResult {
                tool_use_id: invocation.id.clone(),
                name: invocation.name.clone(),
                content: content.clone(),
                is_error: outcome.is_error(),
                duration_ms: outcome.duration_ms,
            })
            .await;

            results.push(ToolResult::new(invocation.id.clone(), content));
        }

        if ctx.is_cancelled() {
            info!(run_id = %ctx.run_id, "run cancelled after tool execution");
            append_turn(state, ctx, cancelled_results(&invocations)).await;
            return Err(LoopError::Cancelled);
        }

        append_turn(state, ctx, Turn::tool_results(results)).await;
        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::Tool
    }
}

/// One `{"error":"cancelled"}` result per invocation, keeping the turn paired
fn cancelled_results(invocations: &[ToolInvocation]) -> Turn {
    let content = json!({"error": "cancelled"}).to_string();
    Turn::tool_results(
        invocations
            .iter()
            .map(|invocation| ToolResult::new(invocation.id.clone(), content.clone()))
            .collect(),
    )
}
