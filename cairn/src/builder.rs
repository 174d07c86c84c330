//! High-level builder API for creating agents

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use cairn_graph::error::SubmitError;
use cairn_llm::Role;
use cairn_tools::{Confirm, DiagnosticsSink, HttpSaveBackend, RingDiagnostics};
use tracing::{info, warn};

use crate::{
    AgentSession, Conversation, FileSessionStore, GraphBuilder, GraphConfig, MessagesClient,
    ModelClient, ModelConfig, ProviderConfig, RunHandle, RunOutcome, ToolRegistry, Turn,
    Workspace,
};

/// High-level builder for creating agents
///
/// # Example
///
/// ```rust,no_run
/// use cairn::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> Result<()> {
/// let agent = AgentBuilder::new()
///     .endpoint("http://localhost:8080/v1/messages")
///     .model(ModelConfig::new("claude-sonnet-4-20250514").with_max_tokens(2048))
///     .confirm(std::sync::Arc::new(AutoApprove))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct AgentBuilder {
    provider: ProviderConfig,
    model: ModelConfig,
    graph_config: GraphConfig,
    client: Option<Arc<dyn ModelClient>>,
    workspace: Option<Workspace>,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
    confirm: Option<Arc<dyn Confirm>>,
    save_endpoint: Option<String>,
    session_path: Option<PathBuf>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    /// Create a new agent builder with the default endpoint and model
    pub fn new() -> Self {
        Self {
            provider: ProviderConfig::default(),
            model: ModelConfig::default(),
            graph_config: GraphConfig::default(),
            client: None,
            workspace: None,
            diagnostics: None,
            confirm: None,
            save_endpoint: None,
            session_path: None,
        }
    }

    /// Messages endpoint (default: the public API)
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.provider.endpoint = endpoint.into();
        self
    }

    /// API key; optional for local proxies
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.provider.api_key = Some(key.into());
        self
    }

    pub fn provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = provider;
        self
    }

    pub fn model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    pub fn graph_config(mut self, config: GraphConfig) -> Self {
        self.graph_config = config;
        self
    }

    /// Use a custom model backend instead of the HTTP client
    pub fn client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Share a workspace with the caller (default: a fresh one)
    pub fn workspace(mut self, workspace: Workspace) -> Self {
        self.workspace = Some(workspace);
        self
    }

    /// Sink collecting ambient errors during tool runs
    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Confirmation gate for `save_document` (default: decline)
    pub fn confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = Some(confirm);
        self
    }

    /// Endpoint receiving saved documents
    pub fn save_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.save_endpoint = Some(endpoint.into());
        self
    }

    /// Session file, restored on build and saved after every run
    pub fn session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    /// Build the agent
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or the graph
    /// configuration is invalid. An unreadable session file is logged and
    /// skipped.
    pub async fn build(self) -> Result<Agent> {
        let client: Arc<dyn ModelClient> = match self.client {
            Some(client) => client,
            None => Arc::new(
                MessagesClient::new(self.provider).context("Failed to create model client")?,
            ),
        };

        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(RingDiagnostics::new()));
        let workspace = self.workspace.unwrap_or_default();

        let mut registry =
            ToolRegistry::new(workspace.clone()).with_diagnostics(Arc::clone(&diagnostics));
        if let Some(confirm) = self.confirm {
            registry = registry.with_confirm(confirm);
        }
        if let Some(endpoint) = self.save_endpoint {
            registry = registry.with_save_backend(Arc::new(HttpSaveBackend::new(endpoint)));
        }

        let graph = GraphBuilder::new()
            .client(client)
            .executor(Arc::new(registry))
            .diagnostics(Arc::clone(&diagnostics))
            .model(self.model)
            .config(self.graph_config)
            .build()
            .context("Failed to build graph")?;

        let mut conversation = Conversation::new(Arc::new(graph));
        let mut restored_turns = 0;
        if let Some(path) = self.session_path {
            conversation = conversation.with_store(Arc::new(FileSessionStore::new(&path)));
            restored_turns = match conversation.restore().await {
                Ok(turns) => turns,
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "ignoring unreadable session");
                    0
                }
            };
        }

        info!(restored_turns, "agent ready");

        Ok(Agent {
            session: AgentSession::new(conversation),
            workspace,
            diagnostics,
            restored_turns,
        })
    }
}

/// A configured agent ready to process conversations
pub struct Agent {
    session: AgentSession,
    workspace: Workspace,
    diagnostics: Arc<dyn DiagnosticsSink>,
    restored_turns: usize,
}

impl Agent {
    /// Run one submission to completion and return the final assistant text
    ///
    /// # Example
    /// ```rust,no_run
    /// # use cairn::prelude::*;
    /// # async fn example(agent: Agent) -> Result<()> {
    /// let answer = agent.chat("What is on line 3?").await?;
    /// println!("{answer}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn chat(&self, message: impl Into<String>) -> Result<String> {
        let mut handle = self.submit(message)?;
        while handle.events.recv().await.is_some() {}

        let outcome = handle.join.await.context("run task failed")??;
        match outcome {
            RunOutcome::Completed => {
                let history = self.session.history()?;
                Ok(history
                    .last()
                    .filter(|turn| turn.role == Role::Assistant)
                    .map(Turn::text)
                    .unwrap_or_default())
            }
            RunOutcome::Cancelled => bail!("run cancelled"),
            RunOutcome::Failed { message } => bail!(message),
        }
    }

    /// Start a submission in the background and stream its events
    pub fn submit(&self, message: impl Into<String>) -> Result<RunHandle, SubmitError> {
        self.session.spawn_submit(message)
    }

    /// The underlying session for advanced usage
    pub fn session(&self) -> &AgentSession {
        &self.session
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn diagnostics(&self) -> &Arc<dyn DiagnosticsSink> {
        &self.diagnostics
    }

    /// Turns restored from the session file on build
    pub fn restored_turns(&self) -> usize {
        self.restored_turns
    }
}
