use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("save response was not JSON: {0}")]
    Decode(String),
}

/// Document handed to the save boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub path: String,
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Secondary I/O boundary for persisting documents.
///
/// The structured result is passed back to the model verbatim.
#[async_trait]
pub trait SaveBackend: Send + Sync {
    async fn save(&self, request: &SaveRequest) -> Result<Value, SaveError>;
}

/// Posts the document as JSON to a save endpoint
pub struct HttpSaveBackend {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpSaveBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SaveBackend for HttpSaveBackend {
    async fn save(&self, request: &SaveRequest) -> Result<Value, SaveError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        // the endpoint reports failures in its JSON body, whatever the status
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), path = %request.path, "save endpoint responded");

        serde_json::from_str(&body).map_err(|e| SaveError::Decode(e.to_string()))
    }
}
