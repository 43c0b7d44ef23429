use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for single-shot text generation (prompt in, text out)
///
/// Implementations return `Err` only for hard failures: transport errors,
/// non-success HTTP statuses and undecodable bodies. A well-formed response
/// that simply carries no text is `Ok` with `text: None`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Non-streaming completion of a single user prompt
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Human-readable provider name, used in user-facing fallback texts
    fn provider_name(&self) -> &str {
        "the completion service"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub options: GenerateOptions,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: GenerateOptions::default(),
        }
    }
    
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }
    
    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
    
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.max_output_tokens.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// First text fragment of the first candidate, if the provider sent one
    pub text: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
    pub raw: serde_json::Value,
}

impl GenerateResponse {
    /// Text with surrounding whitespace removed; `None` when absent or blank
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}
