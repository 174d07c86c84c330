use cairn_llm::ToolDescriptor;
use serde_json::json;

/// Every tool the agent can invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Ping,
    HighlightLines,
    SetLayout,
    RenderChart,
    SaveDocument,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        Self::Ping,
        Self::HighlightLines,
        Self::SetLayout,
        Self::RenderChart,
        Self::SaveDocument,
    ];

    /// Exact-name lookup; unknown names are `None`
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::HighlightLines => "highlight_lines",
            Self::SetLayout => "set_layout",
            Self::RenderChart => "render_chart",
            Self::SaveDocument => "save_document",
        }
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        match self {
            Self::Ping => ToolDescriptor::new(
                self.name(),
                "Check that tool execution works. Has no side effects.",
                json!({"type": "object", "properties": {}}),
            ),
            Self::HighlightLines => ToolDescriptor::new(
                self.name(),
                "Highlight a range of lines in the open document.",
                json!({
                    "type": "object",
                    "properties": {
                        "start_line": {"type": "integer", "minimum": 1},
                        "end_line": {"type": "integer", "minimum": 1},
                        "color": {"type": "string", "description": "CSS color, defaults to yellow"}
                    },
                    "required": ["start_line"]
                }),
            ),
            Self::SetLayout => ToolDescriptor::new(
                self.name(),
                "Change how the document and the conversation are arranged.",
                json!({
                    "type": "object",
                    "properties": {
                        "layout": {"type": "string", "enum": ["split", "stacked", "focus"]}
                    },
                    "required": ["layout"]
                }),
            ),
            Self::RenderChart => ToolDescriptor::new(
                self.name(),
                "Render a chart next to the document.",
                json!({
                    "type": "object",
                    "properties": {
                        "kind": {"type": "string", "enum": ["bar", "line", "pie", "scatter"]},
                        "data": {"type": "object"},
                        "options": {
                            "type": "object",
                            "properties": {
                                "title": {"type": "string"},
                                "stacked": {"type": "boolean"},
                                "colors": {"type": "array", "items": {"type": "string"}}
                            }
                        }
                    },
                    "required": ["kind", "data"]
                }),
            ),
            Self::SaveDocument => ToolDescriptor::new(
                self.name(),
                "Save a document. The user is asked to confirm first.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string"},
                        "content": {"type": "string"},
                        "message": {"type": "string", "description": "Commit message"}
                    },
                    "required": ["path", "content"]
                }),
            ),
        }
    }
}

/// Descriptors for every registered tool, in registry order
pub fn descriptors() -> Vec<ToolDescriptor> {
    ToolKind::ALL.iter().map(ToolKind::descriptor).collect()
}
