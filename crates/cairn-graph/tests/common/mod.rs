#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cairn_graph::{Conversation, Graph, GraphConfig, LoopEvent, RunOutcome};
use cairn_llm::{
    decode_event_stream, EventStream, LlmError, ModelClient, ModelConfig, ModelRequest,
    ToolDescriptor,
};
use cairn_tools::{DiagnosticsSink, ToolExecutor, ToolRegistry, Workspace};
use futures::stream;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// What the scripted backend does for one request
pub enum Script {
    /// Respond with these body chunks, then end
    Chunks(Vec<Bytes>),
    /// Respond with these chunks, then never finish the body
    Hang(Vec<Bytes>),
    /// Fail the request with a non-success status
    Fail(u16, String),
}

/// In-process model backend replaying raw event-stream bytes
#[derive(Default)]
pub struct ScriptedClient {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedClient {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn stream(&self, request: ModelRequest) -> Result<EventStream, LlmError> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::Config("no scripted response left".to_string()))?;

        match script {
            Script::Chunks(chunks) => Ok(decode_event_stream(stream::iter(
                chunks.into_iter().map(Ok::<Bytes, LlmError>),
            ))),
            Script::Hang(chunks) => Ok(decode_event_stream(
                stream::iter(chunks.into_iter().map(Ok::<Bytes, LlmError>))
                    .chain(stream::pending()),
            )),
            Script::Fail(status, body) => Err(LlmError::api(status, &body)),
        }
    }
}

/// One block of a scripted assistant reply
pub enum Reply<'a> {
    Text(&'a str),
    /// Tool invocation; `arguments` is the raw JSON text, streamed in fragments
    Tool {
        id: &'a str,
        name: &'a str,
        arguments: &'a str,
    },
}

pub fn sse(kind: &str, payload: Value) -> String {
    format!("event: {kind}\ndata: {payload}\n\n")
}

/// Full event-stream body for an assistant reply
pub fn reply_body(blocks: &[Reply]) -> String {
    let mut body = sse(
        "message_start",
        json!({"type": "message_start", "message": {"id": "msg_1", "role": "assistant"}}),
    );
    let mut stop_reason = "end_turn";

    for (index, block) in blocks.iter().enumerate() {
        match block {
            Reply::Text(text) => {
                body.push_str(&sse(
                    "content_block_start",
                    json!({"type": "content_block_start", "index": index, "content_block": {"type": "text", "text": ""}}),
                ));
                for piece in pieces(text, 4) {
                    body.push_str(&sse(
                        "content_block_delta",
                        json!({"type": "content_block_delta", "index": index, "delta": {"type": "text_delta", "text": piece}}),
                    ));
                }
            }
            Reply::Tool { id, name, arguments } => {
                stop_reason = "tool_use";
                body.push_str(&sse(
                    "content_block_start",
                    json!({"type": "content_block_start", "index": index, "content_block": {"type": "tool_use", "id": id, "name": name, "input": {}}}),
                ));
                for piece in pieces(arguments, 5) {
                    body.push_str(&sse(
                        "content_block_delta",
                        json!({"type": "content_block_delta", "index": index, "delta": {"type": "input_json_delta", "partial_json": piece}}),
                    ));
                }
            }
        }
        body.push_str(&sse(
            "content_block_stop",
            json!({"type": "content_block_stop", "index": index}),
        ));
    }

    body.push_str(&sse(
        "message_delta",
        json!({"type": "message_delta", "delta": {"stop_reason": stop_reason}}),
    ));
    body.push_str(&sse("message_stop", json!({"type": "message_stop"})));
    body
}

/// A reply delivered in small byte chunks that split lines and code points
pub fn reply(blocks: &[Reply]) -> Script {
    Script::Chunks(chunked(&reply_body(blocks), 7))
}

pub fn chunked(body: &str, size: usize) -> Vec<Bytes> {
    body.as_bytes()
        .chunks(size)
        .map(Bytes::copy_from_slice)
        .collect()
}

fn pieces(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// Executor that never finishes `slow` and answers everything else
pub struct SlowExecutor {
    pub inner: ToolRegistry,
}

#[async_trait]
impl ToolExecutor for SlowExecutor {
    async fn execute(&self, name: &str, arguments: Value) -> Value {
        if name == "slow" {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return json!({"ok": true});
        }
        self.inner.execute(name, arguments).await
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.inner.descriptors()
    }

    fn diagnostics(&self) -> Option<Arc<dyn DiagnosticsSink>> {
        self.inner.diagnostics()
    }
}

pub fn graph(
    client: Arc<ScriptedClient>,
    executor: Arc<dyn ToolExecutor>,
    config: GraphConfig,
) -> Arc<Graph> {
    Arc::new(
        Graph::builder()
            .client(client)
            .executor(executor)
            .model(ModelConfig::new("test-model"))
            .config(config)
            .build()
            .unwrap(),
    )
}

/// Conversation over the built-in tools acting on `workspace`
pub fn conversation(client: Arc<ScriptedClient>, workspace: &Workspace) -> Conversation {
    let registry = Arc::new(ToolRegistry::new(workspace.clone()));
    Conversation::new(graph(client, registry, GraphConfig::default()))
}

/// Submit and collect every event of the run
pub async fn run(conversation: &mut Conversation, text: &str) -> (RunOutcome, Vec<LoopEvent>) {
    let (tx, mut rx) = mpsc::channel(1000);
    let outcome = conversation
        .submit(text, tx, CancellationToken::new())
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (outcome, events)
}

pub fn text_updates(events: &[LoopEvent]) -> Vec<(usize, String)> {
    events
        .iter()
        .filter_map(|event| match event {
            LoopEvent::TextUpdate { block_index, text } => Some((*block_index, text.clone())),
            _ => None,
        })
        .collect()
}

pub fn errors(events: &[LoopEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            LoopEvent::Error { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}
