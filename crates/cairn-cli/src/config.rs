use std::path::Path;
use std::time::Duration;

use cairn::llm::config::{DEFAULT_API_VERSION, DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use cairn::{GraphConfig, ModelConfig, ProviderConfig};
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub save: SaveSection,
    #[serde(default)]
    pub logging: LoggingConfig,

    // Secret (from ENV only)
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSection {
    pub endpoint: String,
    /// Sent as `anthropic-version`; an empty string disables the header
    #[serde(default = "default_api_version")]
    pub api_version: String,
    pub model: String,
    pub max_tokens: u32,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: default_api_version(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    pub max_iterations: usize,
    /// Wait after each tool before collecting ambient errors, 0 = one yield
    pub settle_ms: u64,
    /// Minimum spacing of live text redraws
    pub coalesce_ms: u64,
}

impl Default for AgentSection {
    fn default() -> Self {
        let defaults = GraphConfig::default();
        Self {
            max_iterations: defaults.max_iterations,
            settle_ms: defaults.settle_delay.as_millis() as u64,
            coalesce_ms: defaults.coalesce_window.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionSection {
    /// Session file; no persistence when unset
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveSection {
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (ENV defaults to dev)
    /// 3. CAIRN_<SECTION>__<KEY> environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("CAIRN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets never come from TOML
        cfg.api_key = std::env::var("CAIRN_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        builder.build()?.try_deserialize()
    }

    pub fn provider_config(&self) -> ProviderConfig {
        let mut provider = ProviderConfig::new(&self.model.endpoint);
        if !self.model.api_version.is_empty() {
            provider = provider.with_api_version(&self.model.api_version);
        }
        match &self.api_key {
            Some(key) => provider.with_api_key(key),
            None => provider,
        }
    }

    pub fn model_config(&self) -> ModelConfig {
        let model = ModelConfig::new(&self.model.model).with_max_tokens(self.model.max_tokens);
        match &self.model.system_prompt {
            Some(prompt) if !prompt.trim().is_empty() => model.with_system_prompt(prompt),
            _ => model,
        }
    }

    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig::new()
            .with_max_iterations(self.agent.max_iterations)
            .with_settle_delay(Duration::from_millis(self.agent.settle_ms))
            .with_coalesce_window(Duration::from_millis(self.agent.coalesce_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [model]
            endpoint = "http://localhost:8080/v1/messages"
            model = "test-model"
            max_tokens = 2048
            system_prompt = "be brief"

            [agent]
            max_iterations = 10
            settle_ms = 5
            coalesce_ms = 0

            [session]
            path = "/tmp/session.json"

            [save]
            endpoint = "http://localhost:8080/save"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.model.max_tokens, 2048);
        assert_eq!(config.session.path.as_deref(), Some("/tmp/session.json"));
        assert!(config.api_key.is_none());

        let graph = config.graph_config();
        assert_eq!(graph.max_iterations, 10);
        assert_eq!(graph.settle_delay, Duration::from_millis(5));
        assert!(graph.coalesce_window.is_zero());

        let model = config.model_config();
        assert_eq!(model.model, "test-model");
        assert_eq!(model.system_prompt.as_deref(), Some("be brief"));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[logging]\nlevel = \"info\"\nformat = \"pretty\"\n").unwrap();

        assert_eq!(config.model.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.agent.max_iterations, 50);
        assert_eq!(config.agent.coalesce_ms, 16);
        assert!(config.session.path.is_none());
        let provider = config.provider_config();
        assert!(provider.api_key.is_none());
        assert_eq!(provider.api_version.as_deref(), Some(DEFAULT_API_VERSION));
    }
}
