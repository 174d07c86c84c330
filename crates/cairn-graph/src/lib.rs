pub mod assembler;
pub mod builder;
pub mod coalesce;
pub mod conversation;
pub mod error;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod router;
pub mod session;
pub mod types;

pub use assembler::{parse_arguments_or_empty, AssemblyUpdate, StreamSession};
pub use builder::GraphBuilder;
pub use coalesce::DeltaCoalescer;
pub use conversation::Conversation;
pub use error::{LoopError, SessionError, SubmitError};
pub use graph::Graph;
pub use node::{EventSender, Node, NodeType, RunContext};
pub use router::{NextNode, Router, SimpleRouter};
pub use session::{AgentSession, RunHandle};
pub use types::{ConversationState, GraphConfig, LoopEvent, LoopPhase, RunOutcome};
