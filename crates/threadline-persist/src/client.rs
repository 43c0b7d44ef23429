use std::sync::Arc;

use crate::builder::StoreClientBuilder;
use crate::dbs::memory::InMemoryStore;
use crate::store::{MessageStore, ThreadRegistry};

/// Handle bundling the thread registry and message store of one backend
#[derive(Clone)]
pub struct StoreClient {
    threads: Arc<dyn ThreadRegistry>,
    messages: Arc<dyn MessageStore>,
    backend: &'static str,
}

impl StoreClient {
    pub fn new(
        threads: Arc<dyn ThreadRegistry>,
        messages: Arc<dyn MessageStore>,
        backend: &'static str,
    ) -> Self {
        Self {
            threads,
            messages,
            backend,
        }
    }
    
    pub fn builder() -> StoreClientBuilder {
        StoreClientBuilder::new()
    }
    
    /// Both stores served by one process-local realtime store
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(store.clone(), store, "memory")
    }
    
    pub fn threads(&self) -> &Arc<dyn ThreadRegistry> {
        &self.threads
    }
    
    pub fn messages(&self) -> &Arc<dyn MessageStore> {
        &self.messages
    }
    
    /// Short backend name for logs ("memory", "mongodb")
    pub fn backend(&self) -> &'static str {
        self.backend
    }
}
