use cairn_llm::{validate_history, HistoryError, ToolInvocation, Turn};
use serde::{Deserialize, Serialize};

/// Ordered turn history of one conversation.
///
/// Append-only while a run is active; only the loop appends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate from persisted turns, rejecting broken tool pairing
    pub fn from_turns(turns: Vec<Turn>) -> Result<Self, HistoryError> {
        validate_history(&turns)?;
        Ok(Self { turns })
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn validate(&self) -> Result<(), HistoryError> {
        validate_history(&self.turns)
    }

    /// Invocations of the last turn when it still awaits its results
    pub fn pending_tool_invocations(&self) -> Vec<ToolInvocation> {
        self.last_turn()
            .map(|turn| turn.tool_invocations().into_iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_pending_tool_invocations(&self) -> bool {
        self.last_turn().is_some_and(Turn::has_tool_invocations)
    }

    /// Append a turn, returning its index
    pub(crate) fn append(&mut self, turn: Turn) -> usize {
        self.turns.push(turn);
        self.turns.len() - 1
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_llm::{ContentBlock, ToolResult};
    use serde_json::json;

    #[test]
    fn test_pending_invocations_follow_last_turn() {
        let mut state = ConversationState::new();
        state.append(Turn::user("hi"));
        assert!(!state.has_pending_tool_invocations());

        state.append(Turn::assistant(vec![
            ContentBlock::text("checking"),
            ContentBlock::tool("t1", "ping", json!({})),
            ContentBlock::tool("t2", "set_layout", json!({"layout": "focus"})),
        ]));
        let pending = state.pending_tool_invocations();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[1].name, "set_layout");

        state.append(Turn::tool_results(vec![
            ToolResult::new("t1", "{}"),
            ToolResult::new("t2", "{}"),
        ]));
        assert!(state.pending_tool_invocations().is_empty());
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_from_turns_rejects_unpaired_history() {
        let turns = vec![
            Turn::user("hi"),
            Turn::assistant(vec![ContentBlock::tool("t1", "ping", json!({}))]),
        ];
        assert!(ConversationState::from_turns(turns).is_err());
    }
}
