// Streaming messages-endpoint client (HTTP direct, no SDK)

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::{debug, info, warn};

use crate::buffer_utils::decode_event_stream;
use crate::config::ProviderConfig;
use crate::error::{LlmError, Result};
use crate::streaming::EventStream;
use crate::traits::{ModelClient, ModelRequest};

const API_KEY_HEADER: &str = "x-api-key";
const API_VERSION_HEADER: &str = "anthropic-version";

/// Client for an event-tagged streaming messages endpoint
pub struct MessagesClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl MessagesClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(api_key)
                .map_err(|_| LlmError::Config("invalid API key format".to_string()))?;
            headers.insert(API_KEY_HEADER, value);
        }
        if let Some(version) = &config.api_version {
            let value = HeaderValue::from_str(version)
                .map_err(|_| LlmError::Config("invalid API version format".to_string()))?;
            headers.insert(API_VERSION_HEADER, value);
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelClient for MessagesClient {
    async fn stream(&self, request: ModelRequest) -> Result<EventStream> {
        let payload = serde_json::to_vec(&request)?;

        info!(
            model = %request.model,
            turns = request.messages.len(),
            tools = request.tools.len(),
            "issuing model request"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .body(payload)
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "model request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "model API returned an error status");
            return Err(LlmError::api(status.as_u16(), &error_text));
        }

        debug!(status = status.as_u16(), "streaming response body");
        Ok(decode_event_stream(response.bytes_stream()))
    }
}
