use std::sync::Arc;

use anyhow::{anyhow, Result};
use cairn_llm::{ModelClient, ModelConfig};
use cairn_tools::{DiagnosticsSink, InstrumentedExecutor, RingDiagnostics, ToolExecutor};

use crate::graph::Graph;
use crate::types::GraphConfig;

/// Builder for constructing a Graph
pub struct GraphBuilder {
    client: Option<Arc<dyn ModelClient>>,
    executor: Option<Arc<dyn ToolExecutor>>,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
    model: ModelConfig,
    config: GraphConfig,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            executor: None,
            diagnostics: None,
            model: ModelConfig::default(),
            config: GraphConfig::default(),
        }
    }

    /// Set the model client
    pub fn client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the tool executor
    pub fn executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sink whose entries are attached to tool results as `_page_errors`.
    /// Defaults to the executor's own sink.
    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the Graph
    pub fn build(self) -> Result<Graph> {
        let client = self.client.ok_or_else(|| anyhow!("model client is required"))?;
        let executor = self
            .executor
            .ok_or_else(|| anyhow!("tool executor is required"))?;
        if self.config.max_iterations == 0 {
            return Err(anyhow!("max_iterations must be at least 1"));
        }

        let diagnostics = self
            .diagnostics
            .or_else(|| executor.diagnostics())
            .unwrap_or_else(|| Arc::new(RingDiagnostics::new()));
        let executor = InstrumentedExecutor::new(executor, diagnostics)
            .with_settle_delay(self.config.settle_delay);

        Ok(Graph::new(client, Arc::new(executor), self.model, self.config))
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
