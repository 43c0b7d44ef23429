// Configuration layer for provider-agnostic completion client creation
// This module provides a factory pattern for creating completion clients from configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::gemini::{GeminiClient, DEFAULT_GEMINI_MODEL};
use crate::traits::CompletionClient;

/// Type of completion provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    Gemini,
}

/// Configuration for the Gemini provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    /// Base URL for the Gemini API (optional, defaults to https://generativelanguage.googleapis.com/v1beta)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_gemini_model(),
            base_url: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Provider-specific configuration details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderDetails {
    Gemini(GeminiConfig),
}

/// Complete provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub details: ProviderDetails,
}

impl ProviderConfig {
    /// Create Gemini provider config with the default model
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            details: ProviderDetails::Gemini(GeminiConfig::new(api_key)),
        }
    }

    /// Get the provider type
    pub fn provider_type(&self) -> ProviderType {
        match self.details {
            ProviderDetails::Gemini(_) => ProviderType::Gemini,
        }
    }
}

impl From<GeminiConfig> for ProviderConfig {
    fn from(config: GeminiConfig) -> Self {
        Self {
            details: ProviderDetails::Gemini(config),
        }
    }
}

/// Factory for creating completion clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    /// Create a completion client from provider configuration
    pub fn create_client(config: ProviderConfig) -> Result<Arc<dyn CompletionClient>> {
        match config.details {
            ProviderDetails::Gemini(gemini_config) => {
                let client = GeminiClient::from_config(gemini_config)?;
                Ok(Arc::new(client))
            }
        }
    }
}
