//! # Cairn - streaming agent loop for Rust
//!
//! Cairn drives a language model through an agentic tool loop:
//! - **Incremental streaming**: server-sent events are decoded chunk by chunk
//!   and assembled into typed content blocks while text is still arriving
//! - **Sequential tools**: every tool invocation of a turn runs in order and
//!   is answered with exactly one correlated result
//! - **Ambient error capture**: errors raised while a tool runs are attached
//!   to its result so the model can react
//! - **Sessions**: history is saved after every run and restored on start
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cairn::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let agent = AgentBuilder::new()
//!         .api_key(std::env::var("CAIRN_API_KEY")?)
//!         .session_path("session.json")
//!         .build()
//!         .await?;
//!
//!     let answer = agent.chat("Highlight lines 3 to 5").await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **cairn-llm**: wire types, event-stream decoder, model client
//! - **cairn-tools**: tool registry, instrumentation, diagnostics, save boundary
//! - **cairn-persist**: session snapshots
//! - **cairn-graph**: content block assembler and the agentic loop

pub use cairn_graph as graph;
pub use cairn_llm as llm;
pub use cairn_persist as persist;
pub use cairn_tools as tools;

pub use cairn_graph::{
    AgentSession, Conversation, Graph, GraphBuilder, GraphConfig, LoopEvent, LoopPhase,
    RunHandle, RunOutcome,
};
pub use cairn_llm::{ContentBlock, MessagesClient, ModelClient, ModelConfig, ProviderConfig, Turn};
pub use cairn_persist::{FileSessionStore, SessionStore};
pub use cairn_tools::{ToolExecutor, ToolRegistry, Workspace};

/// High-level builder for creating agents
pub mod builder;

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::builder::{Agent, AgentBuilder};
    pub use crate::graph::{GraphConfig, LoopEvent, LoopPhase, RunOutcome};
    pub use crate::llm::{ContentBlock, ModelConfig, Turn};
    pub use crate::tools::{AutoApprove, AutoDecline, Confirm, Workspace};
    pub use anyhow::Result;
}
