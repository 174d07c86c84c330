use serde::{Deserialize, Serialize};

use super::content::{ContentBlock, ToolInvocation, ToolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One role-tagged unit of conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: TurnContent,
}

impl Turn {
    /// Create a user turn with plain text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Text(text.into()),
        }
    }

    /// Create an assistant turn from finalized blocks
    pub fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Blocks(blocks),
        }
    }

    /// Create the user turn that answers an assistant turn's tool invocations
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::ToolResults(results),
        }
    }

    /// Tool invocations in the order they appear in this turn
    pub fn tool_invocations(&self) -> Vec<&ToolInvocation> {
        match (&self.role, &self.content) {
            (Role::Assistant, TurnContent::Blocks(blocks)) => blocks
                .iter()
                .filter_map(ContentBlock::as_tool_invocation)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// First invocation id used more than once in this turn
    pub fn duplicate_tool_id(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.tool_invocations()
            .into_iter()
            .map(|invocation| invocation.id.as_str())
            .find(|id| !seen.insert(*id))
    }

    pub fn has_tool_invocations(&self) -> bool {
        !self.tool_invocations().is_empty()
    }

    pub fn as_tool_results(&self) -> Option<&[ToolResult]> {
        match (&self.role, &self.content) {
            (Role::User, TurnContent::ToolResults(results)) => Some(results),
            _ => None,
        }
    }

    /// Concatenated text of this turn (blocks joined without separator)
    pub fn text(&self) -> String {
        match &self.content {
            TurnContent::Text(text) => text.clone(),
            TurnContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(ContentBlock::as_text)
                .collect(),
            TurnContent::ToolResults(_) => String::new(),
        }
    }
}

/// Content of a turn: plain text, assistant blocks, or tool results.
///
/// On the wire this is either a string or a list of typed parts
/// (`text`, `tool_use`, `tool_result`). A single list never mixes
/// tool results with other parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireContent", into = "WireContent")]
pub enum TurnContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
    ToolResults(Vec<ToolResult>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart {
    Text { text: String },
    ToolUse(ToolInvocation),
    ToolResult(ToolResult),
}

impl From<TurnContent> for WireContent {
    fn from(content: TurnContent) -> Self {
        match content {
            TurnContent::Text(text) => Self::Text(text),
            TurnContent::Blocks(blocks) => Self::Parts(
                blocks
                    .into_iter()
                    .map(|block| match block {
                        ContentBlock::Text { text } => WirePart::Text { text },
                        ContentBlock::ToolInvocation(invocation) => WirePart::ToolUse(invocation),
                    })
                    .collect(),
            ),
            TurnContent::ToolResults(results) => {
                Self::Parts(results.into_iter().map(WirePart::ToolResult).collect())
            }
        }
    }
}

impl TryFrom<WireContent> for TurnContent {
    type Error = String;

    fn try_from(wire: WireContent) -> Result<Self, Self::Error> {
        let parts = match wire {
            WireContent::Text(text) => return Ok(Self::Text(text)),
            WireContent::Parts(parts) => parts,
        };

        let result_count = parts
            .iter()
            .filter(|part| matches!(part, WirePart::ToolResult(_)))
            .count();

        if result_count > 0 && result_count != parts.len() {
            return Err("tool_result parts cannot be mixed with other content".to_string());
        }

        if result_count > 0 {
            let results = parts
                .into_iter()
                .filter_map(|part| match part {
                    WirePart::ToolResult(result) => Some(result),
                    _ => None,
                })
                .collect();
            return Ok(Self::ToolResults(results));
        }

        let blocks = parts
            .into_iter()
            .filter_map(|part| match part {
                WirePart::Text { text } => Some(ContentBlock::Text { text }),
                WirePart::ToolUse(invocation) => Some(ContentBlock::ToolInvocation(invocation)),
                WirePart::ToolResult(_) => None,
            })
            .collect();
        Ok(Self::Blocks(blocks))
    }
}

impl From<String> for TurnContent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for TurnContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}
