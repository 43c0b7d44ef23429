use serde::{Deserialize, Serialize};

/// Characters of the first assistant reply embedded in the title prompt
pub const DEFAULT_TITLE_EXCERPT_CHARS: usize = 200;

/// Appended to the prompt when the user attached an image
pub const DEFAULT_IMAGE_MARKER: &str = "[User has sent an image]";

/// Assistant message written when persisting the reply itself fails
pub const DEFAULT_FAILURE_TEXT: &str = "Something went wrong getting the response.";

/// Tunables of the synchronization engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub title_excerpt_chars: usize,
    pub image_marker: String,
    pub failure_text: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title_excerpt_chars: DEFAULT_TITLE_EXCERPT_CHARS,
            image_marker: DEFAULT_IMAGE_MARKER.to_string(),
            failure_text: DEFAULT_FAILURE_TEXT.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_title_excerpt_chars(mut self, chars: usize) -> Self {
        self.title_excerpt_chars = chars;
        self
    }
    
    pub fn with_image_marker(mut self, marker: impl Into<String>) -> Self {
        self.image_marker = marker.into();
        self
    }
    
    pub fn with_failure_text(mut self, text: impl Into<String>) -> Self {
        self.failure_text = text.into();
        self
    }
    
    /// Prompt sent to the oracle for a user turn
    pub fn build_prompt(&self, text: &str, has_image: bool) -> String {
        if has_image {
            format!("{}\n{}", text, self.image_marker)
        } else {
            text.to_string()
        }
    }
}
