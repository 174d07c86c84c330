//! Incremental assembly of one assistant turn from protocol events.
//!
//! Blocks are keyed by the protocol `index` but kept in announcement
//! order. Text deltas are appended as they arrive; tool argument
//! fragments are buffered raw and parsed only when the block closes.

use std::collections::HashMap;

use cairn_llm::{ContentBlock, ProtocolEvent};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::LoopError;

/// Parse a tool argument string, substituting `{}` when it is not a JSON
/// object. Executors must cope with missing fields.
pub fn parse_arguments_or_empty(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            debug!(kind = json_kind(&other), "tool arguments are not an object, using {{}}");
            Value::Object(Map::new())
        }
        Err(e) => {
            debug!(error = %e, len = raw.len(), "tool arguments are not valid JSON, using {{}}");
            Value::Object(Map::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Observable progress of the turn being assembled
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyUpdate {
    /// Accumulated text of block `block` after a delta
    Text { block: usize, text: String },

    /// A tool invocation was announced; id and name are final
    ToolStarted { block: usize, id: String, name: String },

    BlockClosed { block: usize },

    /// The backend signalled the end of the message
    MessageStopped { stop_reason: Option<String> },
}

#[derive(Debug)]
enum PendingBlock {
    Text {
        text: String,
        closed: bool,
    },
    Tool {
        id: String,
        name: String,
        raw_arguments: String,
        /// `input` sent with the announcement, used when no fragments follow
        initial_input: Option<Value>,
        arguments: Option<Value>,
    },
}

impl PendingBlock {
    fn is_closed(&self) -> bool {
        match self {
            Self::Text { closed, .. } => *closed,
            Self::Tool { arguments, .. } => arguments.is_some(),
        }
    }

    fn close(&mut self) {
        match self {
            Self::Text { closed, .. } => *closed = true,
            Self::Tool {
                raw_arguments,
                initial_input,
                arguments,
                ..
            } => {
                if arguments.is_none() {
                    let parsed = match initial_input.take() {
                        Some(input) if raw_arguments.is_empty() => input,
                        _ => parse_arguments_or_empty(raw_arguments),
                    };
                    *arguments = Some(parsed);
                }
            }
        }
    }
}

/// Per-request assembly state. Discarded with the request.
#[derive(Debug, Default)]
pub struct StreamSession {
    blocks: Vec<PendingBlock>,
    by_index: HashMap<u64, usize>,
    stop_reason: Option<String>,
    stopped: bool,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks announced so far
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }

    /// Whether `message_stop` was seen
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Apply one protocol event
    pub fn apply(&mut self, event: &ProtocolEvent) -> Result<Option<AssemblyUpdate>, LoopError> {
        let payload = &event.payload;

        match event.event_kind() {
            Some("content_block_start") => Ok(self.start_block(payload)),
            Some("content_block_delta") => Ok(self.apply_delta(payload)),
            Some("content_block_stop") => Ok(self.stop_block(payload)),
            Some("message_delta") => {
                if let Some(reason) = payload
                    .pointer("/delta/stop_reason")
                    .and_then(Value::as_str)
                {
                    self.stop_reason = Some(reason.to_string());
                }
                Ok(None)
            }
            Some("message_stop") => {
                self.stopped = true;
                Ok(Some(AssemblyUpdate::MessageStopped {
                    stop_reason: self.stop_reason.clone(),
                }))
            }
            Some("error") => {
                let message = payload
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| payload.to_string());
                Err(LoopError::Provider(message))
            }
            Some("message_start") | Some("ping") => Ok(None),
            other => {
                debug!(kind = ?other, "ignoring unrecognized event");
                Ok(None)
            }
        }
    }

    /// Finalize every block in announcement order. Blocks that never saw
    /// a stop are closed with the same rules; empty text blocks are dropped.
    pub fn finish(mut self) -> Vec<ContentBlock> {
        let mut finalized = Vec::with_capacity(self.blocks.len());

        for mut block in self.blocks.drain(..) {
            block.close();
            match block {
                PendingBlock::Text { text, .. } => {
                    if !text.is_empty() {
                        finalized.push(ContentBlock::text(text));
                    }
                }
                PendingBlock::Tool {
                    id,
                    name,
                    arguments,
                    ..
                } => {
                    let arguments = arguments.unwrap_or_else(|| Value::Object(Map::new()));
                    finalized.push(ContentBlock::tool(id, name, arguments));
                }
            }
        }

        finalized
    }

    fn start_block(&mut self, payload: &Value) -> Option<AssemblyUpdate> {
        let index = block_index(payload);
        if self.by_index.contains_key(&index) {
            warn!(index, "block announced twice, keeping the first");
            return None;
        }

        let announced = payload.get("content_block").unwrap_or(&Value::Null);
        let block = match announced.get("type").and_then(Value::as_str) {
            Some("text") => PendingBlock::Text {
                text: announced
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                closed: false,
            },
            Some("tool_use") => PendingBlock::Tool {
                id: string_field(announced, "id"),
                name: string_field(announced, "name"),
                raw_arguments: String::new(),
                initial_input: announced
                    .get("input")
                    .filter(|input| input.as_object().is_some_and(|map| !map.is_empty()))
                    .cloned(),
                arguments: None,
            },
            other => {
                debug!(index, kind = ?other, "ignoring unsupported block type");
                return None;
            }
        };

        let position = self.push_block(index, block);
        match &self.blocks[position] {
            PendingBlock::Tool { id, name, .. } => Some(AssemblyUpdate::ToolStarted {
                block: position,
                id: id.clone(),
                name: name.clone(),
            }),
            PendingBlock::Text { text, .. } if !text.is_empty() => Some(AssemblyUpdate::Text {
                block: position,
                text: text.clone(),
            }),
            PendingBlock::Text { .. } => None,
        }
    }

    fn apply_delta(&mut self, payload: &Value) -> Option<AssemblyUpdate> {
        let index = block_index(payload);
        let delta = payload.get("delta").unwrap_or(&Value::Null);

        match delta.get("type").and_then(Value::as_str) {
            Some("text_delta") => {
                let fragment = delta.get("text").and_then(Value::as_str).unwrap_or_default();
                let position = match self.by_index.get(&index) {
                    Some(&position) => position,
                    // text without an announcement opens a block implicitly
                    None => self.push_block(
                        index,
                        PendingBlock::Text {
                            text: String::new(),
                            closed: false,
                        },
                    ),
                };

                match &mut self.blocks[position] {
                    PendingBlock::Text { text, closed: false } => {
                        text.push_str(fragment);
                        Some(AssemblyUpdate::Text {
                            block: position,
                            text: text.clone(),
                        })
                    }
                    _ => {
                        warn!(index, "text delta for a closed or non-text block dropped");
                        None
                    }
                }
            }
            Some("input_json_delta") => {
                let fragment = delta
                    .get("partial_json")
                    .and_then(Value::as_str)
                    .unwrap_or_default();

                let Some(&position) = self.by_index.get(&index) else {
                    warn!(index, "argument fragment for unknown block dropped");
                    return None;
                };

                match &mut self.blocks[position] {
                    PendingBlock::Tool {
                        raw_arguments,
                        arguments: None,
                        ..
                    } => raw_arguments.push_str(fragment),
                    _ => warn!(index, "argument fragment for a closed or non-tool block dropped"),
                }
                None
            }
            other => {
                debug!(index, kind = ?other, "ignoring unsupported delta type");
                None
            }
        }
    }

    fn stop_block(&mut self, payload: &Value) -> Option<AssemblyUpdate> {
        let index = block_index(payload);
        let Some(&position) = self.by_index.get(&index) else {
            debug!(index, "stop for unknown block ignored");
            return None;
        };

        let block = &mut self.blocks[position];
        if block.is_closed() {
            return None;
        }
        block.close();
        Some(AssemblyUpdate::BlockClosed { block: position })
    }

    fn push_block(&mut self, index: u64, block: PendingBlock) -> usize {
        let position = self.blocks.len();
        self.blocks.push(block);
        self.by_index.insert(index, position);
        position
    }
}

fn block_index(payload: &Value) -> u64 {
    payload.get("index").and_then(Value::as_u64).unwrap_or(0)
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: &str, payload: Value) -> ProtocolEvent {
        ProtocolEvent::new(Some(kind), payload)
    }

    #[test]
    fn test_parse_arguments_or_empty() {
        assert_eq!(parse_arguments_or_empty(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_arguments_or_empty(r#"{"a":"#), json!({}));
        assert_eq!(parse_arguments_or_empty(""), json!({}));
        assert_eq!(parse_arguments_or_empty("[1,2]"), json!({}));
    }

    #[test]
    fn test_text_block_accumulates() {
        let mut session = StreamSession::new();
        session
            .apply(&event(
                "content_block_start",
                json!({"index": 0, "content_block": {"type": "text", "text": ""}}),
            ))
            .unwrap();

        let update = session
            .apply(&event(
                "content_block_delta",
                json!({"index": 0, "delta": {"type": "text_delta", "text": "Hel"}}),
            ))
            .unwrap();
        assert_eq!(update, Some(AssemblyUpdate::Text { block: 0, text: "Hel".to_string() }));

        let update = session
            .apply(&event(
                "content_block_delta",
                json!({"index": 0, "delta": {"type": "text_delta", "text": "lo"}}),
            ))
            .unwrap();
        assert_eq!(update, Some(AssemblyUpdate::Text { block: 0, text: "Hello".to_string() }));

        assert_eq!(session.finish(), vec![ContentBlock::text("Hello")]);
    }

    #[test]
    fn test_error_event_fails_the_turn() {
        let mut session = StreamSession::new();
        let err = session
            .apply(&event(
                "error",
                json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}),
            ))
            .unwrap_err();
        assert!(matches!(err, LoopError::Provider(ref m) if m == "Overloaded"));
    }

    #[test]
    fn test_stop_reason_is_recorded() {
        let mut session = StreamSession::new();
        session
            .apply(&event("message_delta", json!({"delta": {"stop_reason": "tool_use"}})))
            .unwrap();
        let update = session.apply(&event("message_stop", json!({}))).unwrap();

        assert_eq!(
            update,
            Some(AssemblyUpdate::MessageStopped { stop_reason: Some("tool_use".to_string()) })
        );
        assert!(session.is_stopped());
    }

    fn tool_turn(id: &str, fragments: &[&str]) -> Vec<ContentBlock> {
        let mut session = StreamSession::new();
        session
            .apply(&event(
                "content_block_start",
                json!({"index": 0, "content_block": {"type": "tool_use", "id": id, "name": "ping", "input": {}}}),
            ))
            .unwrap();
        for fragment in fragments {
            session
                .apply(&event(
                    "content_block_delta",
                    json!({"index": 0, "delta": {"type": "input_json_delta", "partial_json": fragment}}),
                ))
                .unwrap();
        }
        session
            .apply(&event("content_block_stop", json!({"index": 0})))
            .unwrap();
        session.finish()
    }

    #[test]
    fn test_argument_fragments_in_any_split() {
        let raw = r#"{"layout": "focus", "nested": {"n": [1, 2, "é"]}}"#;
        let expected: Value = serde_json::from_str(raw).unwrap();

        let boundaries: Vec<usize> = raw.char_indices().map(|(i, _)| i).skip(1).collect();
        for &split in &boundaries {
            let blocks = tool_turn("t1", &[&raw[..split], &raw[split..]]);
            assert_eq!(blocks, vec![ContentBlock::tool("t1", "ping", expected.clone())]);
        }

        let pieces: Vec<String> = raw.chars().map(String::from).collect();
        let pieces: Vec<&str> = pieces.iter().map(String::as_str).collect();
        assert_eq!(tool_turn("t1", &pieces), vec![ContentBlock::tool("t1", "ping", expected)]);
    }

    #[test]
    fn test_invalid_arguments_finalize_to_empty_object() {
        let blocks = tool_turn("t9", &[r#"{"start_line": "#, "oops"]);
        assert_eq!(blocks, vec![ContentBlock::tool("t9", "ping", json!({}))]);
    }

    #[test]
    fn test_blocks_keep_announcement_order() {
        let mut session = StreamSession::new();
        let events = [
            event("content_block_start", json!({"index": 0, "content_block": {"type": "text", "text": ""}})),
            event("content_block_start", json!({"index": 1, "content_block": {"type": "tool_use", "id": "a", "name": "ping"}})),
            event("content_block_start", json!({"index": 2, "content_block": {"type": "tool_use", "id": "b", "name": "set_layout"}})),
            event("content_block_delta", json!({"index": 2, "delta": {"type": "input_json_delta", "partial_json": "{\"layout\":\"split\"}"}})),
            event("content_block_delta", json!({"index": 0, "delta": {"type": "text_delta", "text": "two tools"}})),
            event("content_block_stop", json!({"index": 2})),
            event("content_block_stop", json!({"index": 0})),
            event("content_block_stop", json!({"index": 1})),
        ];
        for e in &events {
            session.apply(e).unwrap();
        }

        assert_eq!(
            session.finish(),
            vec![
                ContentBlock::text("two tools"),
                ContentBlock::tool("a", "ping", json!({})),
                ContentBlock::tool("b", "set_layout", json!({"layout": "split"})),
            ]
        );
    }
}
