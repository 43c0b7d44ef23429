use std::sync::Arc;

use threadline_llm::{CompletionClient, CompletionOracle};
use threadline_persist::StoreClient;

use crate::config::EngineConfig;
use crate::engine::SyncEngine;
use crate::error::{EngineError, Result};

/// Builder for constructing a SyncEngine
pub struct EngineBuilder {
    store: Option<StoreClient>,
    oracle: Option<CompletionOracle>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            oracle: None,
            config: EngineConfig::default(),
        }
    }
    
    /// Set the thread and message stores
    pub fn store(mut self, store: StoreClient) -> Self {
        self.store = Some(store);
        self
    }
    
    /// Set the completion oracle
    pub fn oracle(mut self, oracle: CompletionOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }
    
    /// Wrap a raw completion client in a default oracle
    pub fn completion_client(self, client: Arc<dyn CompletionClient>) -> Self {
        self.oracle(CompletionOracle::new(client))
    }
    
    /// Set the engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }
    
    /// Build the SyncEngine
    pub fn build(self) -> Result<SyncEngine> {
        let store = self
            .store
            .ok_or_else(|| EngineError::Config("store client is required".to_string()))?;
        let oracle = self
            .oracle
            .ok_or_else(|| EngineError::Config("completion oracle is required".to_string()))?;
        
        tracing::debug!(backend = store.backend(), "Building sync engine");
        Ok(SyncEngine::new(store, oracle, self.config))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
