use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Split,
    Stacked,
    Focus,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Stacked => "stacked",
            Self::Focus => "focus",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "split" => Ok(Self::Split),
            "stacked" => Ok(Self::Stacked),
            "focus" => Ok(Self::Focus),
            other => Err(format!(
                "unknown layout: {other} (expected split, stacked or focus)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub start_line: u32,
    pub end_line: u32,
    pub color: String,
}

/// Rendering options the chart renderer accepts; anything else is rejected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: String,
    pub kind: String,
    pub data: Value,
    pub options: ChartOptions,
}

/// One applied side effect, in application order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum WorkspaceChange {
    Highlight(Highlight),
    Layout { layout: Layout },
    Chart { id: String, kind: String },
    Saved { path: String },
}

#[derive(Debug, Default)]
struct WorkspaceInner {
    layout: Layout,
    highlights: Vec<Highlight>,
    charts: Vec<Chart>,
    journal: Vec<WorkspaceChange>,
}

/// Shared state mutated by tools. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    inner: Arc<RwLock<WorkspaceInner>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_highlight(&self, highlight: Highlight) {
        let mut inner = self.inner.write().await;
        inner.highlights.push(highlight.clone());
        inner.journal.push(WorkspaceChange::Highlight(highlight));
    }

    pub async fn set_layout(&self, layout: Layout) {
        let mut inner = self.inner.write().await;
        inner.layout = layout;
        inner.journal.push(WorkspaceChange::Layout { layout });
    }

    /// Store a chart and return its id (`chart-1`, `chart-2`, ...)
    pub async fn add_chart(&self, kind: String, data: Value, options: ChartOptions) -> String {
        let mut inner = self.inner.write().await;
        let id = format!("chart-{}", inner.charts.len() + 1);
        inner.charts.push(Chart {
            id: id.clone(),
            kind: kind.clone(),
            data,
            options,
        });
        inner.journal.push(WorkspaceChange::Chart {
            id: id.clone(),
            kind,
        });
        id
    }

    pub async fn record_saved(&self, path: String) {
        self.inner
            .write()
            .await
            .journal
            .push(WorkspaceChange::Saved { path });
    }

    pub async fn layout(&self) -> Layout {
        self.inner.read().await.layout
    }

    pub async fn highlights(&self) -> Vec<Highlight> {
        self.inner.read().await.highlights.clone()
    }

    pub async fn charts(&self) -> Vec<Chart> {
        self.inner.read().await.charts.clone()
    }

    pub async fn journal(&self) -> Vec<WorkspaceChange> {
        self.inner.read().await.journal.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_parsing() {
        assert_eq!("focus".parse::<Layout>(), Ok(Layout::Focus));
        assert!("grid".parse::<Layout>().unwrap_err().contains("unknown layout: grid"));
    }

    #[tokio::test]
    async fn test_journal_keeps_application_order() {
        let workspace = Workspace::new();
        workspace.set_layout(Layout::Stacked).await;
        let id = workspace
            .add_chart("bar".to_string(), Value::Null, ChartOptions::default())
            .await;

        assert_eq!(id, "chart-1");
        assert_eq!(
            workspace.journal().await,
            vec![
                WorkspaceChange::Layout { layout: Layout::Stacked },
                WorkspaceChange::Chart { id: "chart-1".to_string(), kind: "bar".to_string() },
            ]
        );
    }
}
