//! # Threadline
//!
//! Conversation threads and messages kept in sync with a realtime store,
//! answered by a text-completion service.
//!
//! ## Overview
//!
//! - **Send** a message: the thread is created on first use, the user turn is
//!   persisted before the completion is requested, and the reply is persisted
//!   after it arrives
//! - **Watch** the selected thread's messages and the signed-in user's thread
//!   list through `tokio::sync::watch` views
//! - **Title** new threads from their first exchange, with a local fallback
//! - **Delete** a thread by removing its messages first
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use threadline::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ClientFactory::create_client(ProviderConfig::gemini(
//!         std::env::var("GEMINI_API_KEY")?,
//!     ))?;
//!
//!     let engine = SyncEngine::builder()
//!         .store(StoreClient::in_memory())
//!         .completion_client(client)
//!         .build()?;
//!
//!     engine.set_principal(Some(Principal::new("user-1"))).await?;
//!
//!     let outcome = engine.send_message("What is the capital of France?").await?;
//!     if let Some(thread_id) = outcome.thread_id() {
//!         for message in engine.store().messages().list(thread_id).await? {
//!             println!("[{}] {}", message.sender, message.text);
//!         }
//!     }
//!
//!     engine.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`threadline-llm`**: completion client trait, Gemini client, never-failing oracle
//! - **`threadline-persist`**: thread/message model, store traits, in-memory and MongoDB backends
//! - **`threadline-engine`**: synchronization engine, title synthesizer, live views
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use threadline_engine::{
    heuristic_title, Composer, EngineBuilder, EngineConfig, EngineError, Principal,
    SendOutcome, SendState, SyncEngine, TitleSynthesizer,
};

pub use threadline_llm::{
    ClientFactory, CompletionClient, CompletionOracle, GeminiClient, GeminiConfig,
    GenerateOptions, GenerateRequest, GenerateResponse, ProviderConfig,
};

pub use threadline_persist::{
    ImageRef, InMemoryStore, Message, MessageId, MessageStore, NewMessage, Sender, StoreClient,
    StoreClientBuilder, StoreError, Subscription, Thread, ThreadId, ThreadRegistry,
    PLACEHOLDER_TITLE,
};

#[cfg(feature = "mongodb")]
pub use threadline_persist::MongoStore;
