pub mod state;
pub mod config;
pub mod events;

pub use state::ConversationState;
pub use config::GraphConfig;
pub use events::{LoopEvent, LoopPhase, RunOutcome};
