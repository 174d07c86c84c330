use std::sync::Arc;

use cairn_llm::{ModelClient, ModelConfig};
use cairn_tools::InstrumentedExecutor;
use tracing::{info, warn};

use crate::error::LoopError;
use crate::node::{Node, NodeType, RunContext};
use crate::nodes::{LLMNode, ToolNode};
use crate::router::{NextNode, Router, SimpleRouter};
use crate::types::{ConversationState, GraphConfig};

/// The agentic loop: model request, tool round, repeat.
///
/// Holds no conversation state and can be shared between conversations.
pub struct Graph {
    client: Arc<dyn ModelClient>,
    executor: Arc<InstrumentedExecutor>,
    model: ModelConfig,
    config: GraphConfig,
}

impl Graph {
    pub fn new(
        client: Arc<dyn ModelClient>,
        executor: Arc<InstrumentedExecutor>,
        model: ModelConfig,
        config: GraphConfig,
    ) -> Self {
        Self {
            client,
            executor,
            model,
            config,
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> crate::builder::GraphBuilder {
        crate::builder::GraphBuilder::new()
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Run until the model answers without tool invocations.
    ///
    /// `state` must already end with the user turn that started the run.
    pub async fn run(&self, state: &mut ConversationState, ctx: &RunContext) -> Result<(), LoopError> {
        let llm_node = LLMNode::new(
            Arc::clone(&self.client),
            Arc::clone(&self.executor),
            self.model.clone(),
        )
        .with_coalesce_window(self.config.coalesce_window);
        let tool_node = ToolNode::new(Arc::clone(&self.executor));
        let router = SimpleRouter;

        let mut current_node = NodeType::LLM;
        let mut requests = 0;

        loop {
            match current_node {
                NodeType::LLM => {
                    if ctx.is_cancelled() {
                        return Err(LoopError::Cancelled);
                    }
                    // Guardrail: max model requests per submission
                    if requests >= self.config.max_iterations {
                        warn!(run_id = %ctx.run_id, max = self.config.max_iterations, "max iterations reached");
                        return Err(LoopError::MaxIterations(self.config.max_iterations));
                    }
                    requests += 1;
                    llm_node.execute(state, ctx).await?;
                }
                // answers pending invocations even when already cancelled
                NodeType::Tool => tool_node.execute(state, ctx).await?,
            }

            current_node = match router.next(state, current_node) {
                NextNode::End => break,
                NextNode::LLM => NodeType::LLM,
                NextNode::Tool => NodeType::Tool,
            };
        }

        info!(run_id = %ctx.run_id, requests, turns = state.len(), "run completed");
        Ok(())
    }
}
