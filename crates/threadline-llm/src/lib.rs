pub mod traits;
pub mod config;
pub mod gemini;
pub mod oracle;

pub use traits::{
    CompletionClient,
    GenerateRequest, GenerateResponse, GenerateOptions,
    TokenUsage,
};

pub use config::{ClientFactory, GeminiConfig, ProviderConfig, ProviderDetails, ProviderType};
pub use gemini::GeminiClient;
pub use oracle::{CompletionOracle, UNREADABLE_RESPONSE_TEXT};
