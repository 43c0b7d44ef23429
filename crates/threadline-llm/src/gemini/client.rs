// Gemini-specific client implementation

use crate::config::GeminiConfig;
use crate::gemini::types::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use crate::traits::{CompletionClient, GenerateRequest, GenerateResponse, TokenUsage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Gemini client (HTTP direct, no SDK)
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Create new client with API key and the default model
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(GeminiConfig::new(api_key))
    }
    
    pub fn from_config(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            anyhow::bail!("Gemini API key is required");
        }
        
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;
        
        let base_url = config
            .base_url
            .unwrap_or_else(|| GEMINI_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        
        Ok(Self {
            http_client,
            base_url,
            model: config.model,
            api_key: config.api_key,
        })
    }
    
    pub fn model(&self) -> &str {
        &self.model
    }
    
    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
    
    /// Build generateContent request payload
    fn build_payload(&self, request: &GenerateRequest) -> GenerateContentRequest {
        let mut payload = GenerateContentRequest::user_prompt(request.prompt.as_str());
        
        if !request.options.is_empty() {
            payload.generation_config = Some(GenerationConfig {
                temperature: request.options.temperature,
                max_output_tokens: request.options.max_output_tokens,
            });
        }
        
        payload
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let payload = self.build_payload(&request);
        
        tracing::debug!(model = %self.model, prompt_len = request.prompt.len(), "Sending generateContent request");
        
        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;
        
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }
        
        let raw: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse response")?;
        
        let parsed: GenerateContentResponse = serde_json::from_value(raw.clone())
            .context("Unexpected response shape")?;
        
        // Convert to provider-agnostic response
        Ok(GenerateResponse {
            text: parsed.first_text().map(str::to_string),
            finish_reason: parsed.finish_reason().map(str::to_string),
            usage: parsed.usage_metadata.as_ref().map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
            raw,
        })
    }
    
    fn provider_name(&self) -> &str {
        "Gemini"
    }
}
