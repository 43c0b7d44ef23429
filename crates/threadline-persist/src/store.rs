use async_trait::async_trait;
use futures::future::try_join_all;

use crate::error::Result;
use crate::models::{Message, MessageId, NewMessage, Thread, ThreadId};
use crate::subscription::Subscription;

/// Append-only, per-thread message log with live ordered subscriptions
///
/// Implementations assign ids and server timestamps. Nothing here enforces
/// that `thread_id` names an existing thread.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Write a new message with a server-assigned timestamp
    async fn append(&self, thread_id: &ThreadId, message: NewMessage) -> Result<MessageId>;
    
    /// All messages of a thread, oldest first
    async fn list(&self, thread_id: &ThreadId) -> Result<Vec<Message>>;
    
    /// Live view of a thread's messages; first snapshot is the current state
    async fn subscribe(&self, thread_id: &ThreadId) -> Result<Subscription<Message>>;
    
    /// Remove one message
    async fn delete(&self, thread_id: &ThreadId, message_id: &MessageId) -> Result<()>;
    
    /// Remove every message under the thread
    ///
    /// Not atomic: lists, then deletes each message. A message appended while
    /// this runs can survive it. Returns how many messages were deleted.
    async fn delete_all(&self, thread_id: &ThreadId) -> Result<usize> {
        let messages = self.list(thread_id).await?;
        let count = messages.len();
        
        try_join_all(
            messages
                .iter()
                .map(|message| self.delete(thread_id, &message.id)),
        )
        .await?;
        
        tracing::debug!(thread_id = %thread_id, count, "Deleted thread messages");
        Ok(count)
    }
}

/// Owner-scoped collection of thread summaries with live ordered subscriptions
#[async_trait]
pub trait ThreadRegistry: Send + Sync {
    /// Create a thread titled [`crate::PLACEHOLDER_TITLE`] stamped with the current server time
    async fn create(&self, owner_id: &str) -> Result<ThreadId>;
    
    async fn get(&self, thread_id: &ThreadId) -> Result<Option<Thread>>;
    
    /// Threads of an owner, newest first
    async fn list(&self, owner_id: &str) -> Result<Vec<Thread>>;
    
    /// Live view of an owner's threads; first snapshot is the current state
    async fn subscribe(&self, owner_id: &str) -> Result<Subscription<Thread>>;
    
    /// Overwrite the title; `ThreadNotFound` if the thread is gone
    async fn set_title(&self, thread_id: &ThreadId, title: &str) -> Result<()>;
    
    /// Remove the thread record (its messages are not touched)
    async fn delete(&self, thread_id: &ThreadId) -> Result<()>;
}
