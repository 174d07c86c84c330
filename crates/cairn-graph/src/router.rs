use crate::node::NodeType;
use crate::types::ConversationState;

/// Decides which node runs next
pub trait Router: Send + Sync {
    fn next(&self, state: &ConversationState, current: NodeType) -> NextNode;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextNode {
    LLM,
    Tool,
    End,
}

/// LLM -> Tool (while the last turn invokes tools) -> LLM -> End
pub struct SimpleRouter;

impl Router for SimpleRouter {
    fn next(&self, state: &ConversationState, current: NodeType) -> NextNode {
        match current {
            NodeType::LLM => {
                if state.has_pending_tool_invocations() {
                    NextNode::Tool
                } else {
                    NextNode::End
                }
            }
            NodeType::Tool => NextNode::LLM,
        }
    }
}
