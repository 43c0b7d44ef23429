use thiserror::Error;

use threadline_persist::{StoreError, ThreadId};

#[derive(Error, Debug)]
pub enum EngineError {
    /// No principal is signed in
    #[error("No authenticated principal")]
    Unauthenticated,
    
    /// The thread does not exist, or no longer does
    #[error("Thread not found: {0}")]
    ThreadNotFound(ThreadId),
    
    /// The thread belongs to someone other than the signed-in principal
    #[error("Thread {thread_id} is not owned by {principal}")]
    NotOwner {
        thread_id: ThreadId,
        principal: String,
    },
    
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    
    /// Cascading deletion stopped partway; the thread record is left in place
    #[error("Deletion of thread {thread_id} did not complete: {source}")]
    DeletionIncomplete {
        thread_id: ThreadId,
        #[source]
        source: StoreError,
    },
    
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
