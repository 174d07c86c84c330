use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One typed fragment of an assistant turn.
///
/// Order inside a turn is significant: text and tool invocations are
/// replayed to the model exactly as they were streamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Accumulated text of one assistant utterance segment
    Text { text: String },

    /// A tool call requested by the model
    #[serde(rename = "tool_use")]
    ToolInvocation(ToolInvocation),
}

impl ContentBlock {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { text: s.into() }
    }

    pub fn tool(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: Value,
    ) -> Self {
        Self::ToolInvocation(ToolInvocation::new(id, name, arguments))
    }

    /// Text content, if this is a text block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::ToolInvocation(_) => None,
        }
    }

    pub fn as_tool_invocation(&self) -> Option<&ToolInvocation> {
        match self {
            Self::ToolInvocation(invocation) => Some(invocation),
            Self::Text { .. } => None,
        }
    }
}

/// Tool call made by the model (inside an assistant turn)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,

    /// Fully parsed arguments, always a JSON object
    #[serde(rename = "input")]
    pub arguments: Value,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Correlated output of one tool invocation, keyed by its id.
///
/// `content` is the JSON-encoded executor output including the
/// `_duration_ms` / `_page_errors` diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: String,
}

impl ToolResult {
    pub fn new(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
        }
    }

    /// Decode `content` back into JSON
    pub fn content_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.content)
    }
}
