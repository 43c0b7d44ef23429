pub mod client;
pub mod types;

pub use client::{GeminiClient, DEFAULT_GEMINI_MODEL, GEMINI_API_BASE};
pub use types::{
    Candidate, CandidateContent, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part, RequestContent, UsageMetadata,
};
