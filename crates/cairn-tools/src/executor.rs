use std::sync::Arc;

use async_trait::async_trait;
use cairn_llm::ToolDescriptor;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::confirm::{AutoDecline, Confirm};
use crate::diagnostics::{DiagnosticEntry, DiagnosticsSink, RingDiagnostics};
use crate::registry::{self, ToolKind};
use crate::save::{SaveBackend, SaveRequest};
use crate::workspace::{ChartOptions, Highlight, Layout, Workspace};

/// Executes a tool by name.
///
/// Failures are data: an unknown name or bad arguments produce an
/// `{"error": ...}` value so the loop can report them to the model.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, arguments: Value) -> Value;

    /// Descriptors passed verbatim to the model request
    fn descriptors(&self) -> Vec<ToolDescriptor>;

    /// Sink this executor reports ambient errors into, if it has one
    fn diagnostics(&self) -> Option<Arc<dyn DiagnosticsSink>> {
        None
    }
}

/// Error result in the shape the model sees
pub fn error_result(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

/// The built-in tools, dispatched through [`ToolKind`]
pub struct ToolRegistry {
    workspace: Workspace,
    diagnostics: Arc<dyn DiagnosticsSink>,
    confirm: Arc<dyn Confirm>,
    save_backend: Option<Arc<dyn SaveBackend>>,
}

impl ToolRegistry {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            diagnostics: Arc::new(RingDiagnostics::new()),
            confirm: Arc::new(AutoDecline),
            save_backend: None,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn with_save_backend(mut self, backend: Arc<dyn SaveBackend>) -> Self {
        self.save_backend = Some(backend);
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    async fn dispatch(&self, kind: ToolKind, arguments: Value) -> Value {
        match kind {
            ToolKind::Ping => json!({"ok": true, "pong": true}),
            ToolKind::HighlightLines => match decode::<HighlightArgs>(kind, arguments) {
                Ok(args) => self.highlight_lines(args).await,
                Err(e) => e,
            },
            ToolKind::SetLayout => match decode::<LayoutArgs>(kind, arguments) {
                Ok(args) => self.set_layout(args).await,
                Err(e) => e,
            },
            ToolKind::RenderChart => match decode::<ChartArgs>(kind, arguments) {
                Ok(args) => self.render_chart(args).await,
                Err(e) => e,
            },
            ToolKind::SaveDocument => match decode::<SaveRequest>(kind, arguments) {
                Ok(args) => self.save_document(args).await,
                Err(e) => e,
            },
        }
    }

    async fn highlight_lines(&self, args: HighlightArgs) -> Value {
        let end_line = args.end_line.unwrap_or(args.start_line);
        if args.start_line == 0 || end_line < args.start_line {
            return error_result(format!(
                "invalid line range {}..{}",
                args.start_line, end_line
            ));
        }

        let highlight = Highlight {
            start_line: args.start_line,
            end_line,
            color: args.color,
        };
        self.workspace.add_highlight(highlight.clone()).await;

        json!({
            "ok": true,
            "start_line": highlight.start_line,
            "end_line": highlight.end_line,
            "color": highlight.color,
        })
    }

    async fn set_layout(&self, args: LayoutArgs) -> Value {
        match args.layout.parse::<Layout>() {
            Ok(layout) => {
                self.workspace.set_layout(layout).await;
                json!({"ok": true, "layout": layout.as_str()})
            }
            Err(e) => error_result(e),
        }
    }

    async fn render_chart(&self, args: ChartArgs) -> Value {
        let options = match args.options {
            None => ChartOptions::default(),
            Some(raw) => match serde_json::from_value::<ChartOptions>(raw) {
                Ok(options) => options,
                Err(e) => {
                    // the renderer rejects the options after the chart is placed
                    warn!(error = %e, "chart options rejected by renderer");
                    self.diagnostics.push(
                        DiagnosticEntry::new(format!("render_chart: invalid chart options: {e}"))
                            .with_source(ToolKind::RenderChart.name()),
                    );
                    ChartOptions::default()
                }
            },
        };

        let chart_id = self
            .workspace
            .add_chart(args.kind.clone(), args.data, options)
            .await;

        json!({"ok": true, "chart_id": chart_id, "kind": args.kind})
    }

    async fn save_document(&self, request: SaveRequest) -> Value {
        let prompt = format!("Save {} ({} bytes)?", request.path, request.content.len());
        if !self.confirm.confirm(&prompt).await {
            info!(path = %request.path, "save declined by user");
            return json!({"ok": false, "reason": "cancelled"});
        }

        let Some(backend) = &self.save_backend else {
            return error_result("no save backend configured");
        };

        match backend.save(&request).await {
            Ok(result) => {
                self.workspace.record_saved(request.path).await;
                result
            }
            Err(e) => {
                warn!(error = %e, path = %request.path, "save failed");
                error_result(e.to_string())
            }
        }
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, name: &str, arguments: Value) -> Value {
        let Some(kind) = ToolKind::from_name(name) else {
            warn!(tool = name, "unknown tool requested");
            return error_result(format!("Unknown tool: {name}"));
        };

        debug!(tool = name, "dispatching tool");
        self.dispatch(kind, arguments).await
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        registry::descriptors()
    }

    fn diagnostics(&self) -> Option<Arc<dyn DiagnosticsSink>> {
        Some(Arc::clone(&self.diagnostics))
    }
}

fn decode<T: DeserializeOwned>(kind: ToolKind, arguments: Value) -> Result<T, Value> {
    serde_json::from_value(arguments)
        .map_err(|e| error_result(format!("invalid arguments for {}: {e}", kind.name())))
}

#[derive(Deserialize)]
struct HighlightArgs {
    start_line: u32,
    #[serde(default)]
    end_line: Option<u32>,
    #[serde(default = "default_color")]
    color: String,
}

fn default_color() -> String {
    "yellow".to_string()
}

#[derive(Deserialize)]
struct LayoutArgs {
    layout: String,
}

#[derive(Deserialize)]
struct ChartArgs {
    #[serde(default = "default_chart_kind")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    options: Option<Value>,
}

fn default_chart_kind() -> String {
    "bar".to_string()
}
