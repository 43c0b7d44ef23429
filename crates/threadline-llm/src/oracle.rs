use std::sync::Arc;

use anyhow::Result;

use crate::traits::{CompletionClient, GenerateOptions, GenerateRequest};

/// Returned when the provider answers but no text fragment can be extracted
pub const UNREADABLE_RESPONSE_TEXT: &str = "I couldn't understand that.";

/// Completion oracle that always yields text
///
/// `complete` never fails: hard client errors become a fixed
/// "Something went wrong while contacting <provider>." string and responses
/// without text become [`UNREADABLE_RESPONSE_TEXT`]. Callers that need to
/// tell a hard failure apart (title synthesis) use `try_complete`.
#[derive(Clone)]
pub struct CompletionOracle {
    client: Arc<dyn CompletionClient>,
    options: GenerateOptions,
    fallback_text: String,
}

impl CompletionOracle {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        let fallback_text = format!(
            "Something went wrong while contacting {}.",
            client.provider_name()
        );
        Self {
            client,
            options: GenerateOptions::default(),
            fallback_text,
        }
    }
    
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
    
    pub fn fallback_text(&self) -> &str {
        &self.fallback_text
    }
    
    /// Send the prompt and return the first candidate's text, or a fallback string
    pub async fn complete(&self, prompt: &str) -> String {
        match self.try_complete(prompt).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::warn!("Completion response carried no text");
                UNREADABLE_RESPONSE_TEXT.to_string()
            }
            Err(e) => {
                tracing::warn!(provider = %self.client.provider_name(), "Completion request failed: {:#}", e);
                self.fallback_text.clone()
            }
        }
    }
    
    /// Raw completion: `Err` on hard failure, `Ok(None)` when no text came back
    pub async fn try_complete(&self, prompt: &str) -> Result<Option<String>> {
        let request = GenerateRequest::new(prompt).with_options(self.options.clone());
        let response = self.client.generate(request).await?;
        Ok(response.text.filter(|t| !t.is_empty()))
    }
}
