use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use threadline_engine::{EngineConfig, Principal};
use threadline_llm::{GeminiConfig, GenerateOptions, ProviderConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub gemini_api_key: String,
    #[serde(default)]
    pub mongodb_uri: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

impl LlmConfig {
    pub fn provider(&self, api_key: &str) -> ProviderConfig {
        let mut gemini = GeminiConfig::new(api_key).with_model(&self.model);
        if let Some(base_url) = &self.base_url {
            gemini = gemini.with_base_url(base_url);
        }
        gemini.into()
    }

    pub fn options(&self) -> GenerateOptions {
        let mut options = GenerateOptions::new();
        if let Some(temperature) = self.temperature {
            options = options.temperature(temperature);
        }
        if let Some(tokens) = self.max_output_tokens {
            options = options.max_output_tokens(tokens);
        }
        options
    }
}

/// Principal the REPL signs in as
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl From<&SessionConfig> for Principal {
    fn from(config: &SessionConfig) -> Self {
        let principal = Principal::new(&config.user_id);
        match &config.display_name {
            Some(name) => principal.with_display_name(name),
            None => principal,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. THREADLINE_<SECTION>__<KEY> environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("THREADLINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.gemini_api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::Message("GEMINI_API_KEY environment variable is required".to_string()))?;
        cfg.mongodb_uri = std::env::var("MONGODB_URI").ok();

        cfg.validate()?;
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Cross-field checks that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::Mongodb
            && self.mongodb_uri.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Message(
                "MONGODB_URI environment variable is required for the mongodb backend".to_string(),
            ));
        }
        Ok(())
    }
}
