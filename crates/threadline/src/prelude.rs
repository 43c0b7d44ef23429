//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use threadline::prelude::*;
//! ```

pub use crate::{
    SyncEngine, EngineBuilder, EngineConfig, EngineError, Principal, SendOutcome, SendState,
    ClientFactory, CompletionClient, CompletionOracle, GeminiConfig, ProviderConfig,
    Message, Sender, Thread, ThreadId, ImageRef, StoreClient, MessageStore, ThreadRegistry,
};
