pub mod llm_node;
pub mod tool_node;

pub use llm_node::LLMNode;
pub use tool_node::ToolNode;

use cairn_llm::Turn;

use crate::node::RunContext;
use crate::types::{ConversationState, LoopEvent};

/// Append a turn and announce it
pub(crate) async fn append_turn(state: &mut ConversationState, ctx: &RunContext, turn: Turn) {
    let index = state.append(turn.clone());
    ctx.emit(LoopEvent::TurnAppended { index, turn }).await;
}
