use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{watch, Mutex};

use crate::error::{Result, StoreError};
use crate::models::{Message, MessageId, NewMessage, Thread, ThreadId, PLACEHOLDER_TITLE};
use crate::store::{MessageStore, ThreadRegistry};
use crate::subscription::Subscription;

#[derive(Default)]
struct State {
    threads: HashMap<ThreadId, Thread>,
    messages: HashMap<ThreadId, Vec<Message>>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl State {
    /// Strictly increasing server clock
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(stamp);
        stamp
    }
    
    fn messages_of(&self, thread_id: &ThreadId) -> Vec<Message> {
        let mut messages = self.messages.get(thread_id).cloned().unwrap_or_default();
        Message::sort_chronologically(&mut messages);
        messages
    }
    
    fn threads_of(&self, owner_id: &str) -> Vec<Thread> {
        let mut threads: Vec<Thread> = self
            .threads
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        Thread::sort_newest_first(&mut threads);
        threads
    }
}

/// Process-local realtime document store
///
/// Every committed write bumps a revision counter; subscriptions re-run
/// their ordered query on each revision and forward the result when it
/// differs from what they last delivered.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    revision: Arc<watch::Sender<u64>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            revision: Arc::new(revision),
        }
    }
    
    fn commit(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
    
    /// Spawn a task re-running `query` after every commit
    fn watch_query<T, F>(&self, query: F) -> Subscription<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&State) -> Vec<T> + Send + 'static,
    {
        let (tx, subscription) = Subscription::channel();
        let state = Arc::clone(&self.state);
        let mut revision = self.revision.subscribe();
        
        let task = tokio::spawn(async move {
            let mut last: Option<Vec<T>> = None;
            loop {
                let _seen = *revision.borrow_and_update();
                let snapshot = {
                    let state = state.lock().await;
                    query(&state)
                };
                if last.as_ref() != Some(&snapshot) {
                    if tx.send(snapshot.clone()).is_err() {
                        break;
                    }
                    last = Some(snapshot);
                }
                if revision.changed().await.is_err() {
                    break;
                }
            }
        });
        
        subscription.attach(task)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn append(&self, thread_id: &ThreadId, message: NewMessage) -> Result<MessageId> {
        message.validate()?;
        
        let id = MessageId::new(uuid::Uuid::new_v4().to_string());
        {
            let mut state = self.state.lock().await;
            let created_at = state.next_timestamp();
            let message = message.into_message(id.clone(), thread_id.clone(), created_at);
            state.messages.entry(thread_id.clone()).or_default().push(message);
        }
        self.commit();
        
        Ok(id)
    }
    
    async fn list(&self, thread_id: &ThreadId) -> Result<Vec<Message>> {
        Ok(self.state.lock().await.messages_of(thread_id))
    }
    
    async fn subscribe(&self, thread_id: &ThreadId) -> Result<Subscription<Message>> {
        let thread_id = thread_id.clone();
        Ok(self.watch_query(move |state| state.messages_of(&thread_id)))
    }
    
    async fn delete(&self, thread_id: &ThreadId, message_id: &MessageId) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            let messages = state
                .messages
                .get_mut(thread_id)
                .ok_or_else(|| StoreError::MessageNotFound(message_id.to_string()))?;
            let before = messages.len();
            messages.retain(|m| &m.id != message_id);
            if messages.len() == before {
                return Err(StoreError::MessageNotFound(message_id.to_string()));
            }
            if messages.is_empty() {
                state.messages.remove(thread_id);
            }
        }
        self.commit();
        Ok(())
    }
}

#[async_trait]
impl ThreadRegistry for InMemoryStore {
    async fn create(&self, owner_id: &str) -> Result<ThreadId> {
        let id = ThreadId::new(uuid::Uuid::new_v4().to_string());
        {
            let mut state = self.state.lock().await;
            let created_at = state.next_timestamp();
            state.threads.insert(
                id.clone(),
                Thread {
                    id: id.clone(),
                    title: PLACEHOLDER_TITLE.to_string(),
                    created_at,
                    owner_id: owner_id.to_string(),
                },
            );
        }
        self.commit();
        
        tracing::debug!(thread_id = %id, owner_id, "Thread created");
        Ok(id)
    }
    
    async fn get(&self, thread_id: &ThreadId) -> Result<Option<Thread>> {
        Ok(self.state.lock().await.threads.get(thread_id).cloned())
    }
    
    async fn list(&self, owner_id: &str) -> Result<Vec<Thread>> {
        Ok(self.state.lock().await.threads_of(owner_id))
    }
    
    async fn subscribe(&self, owner_id: &str) -> Result<Subscription<Thread>> {
        let owner_id = owner_id.to_string();
        Ok(self.watch_query(move |state| state.threads_of(&owner_id)))
    }
    
    async fn set_title(&self, thread_id: &ThreadId, title: &str) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            let thread = state
                .threads
                .get_mut(thread_id)
                .ok_or_else(|| StoreError::ThreadNotFound(thread_id.to_string()))?;
            thread.title = title.to_string();
        }
        self.commit();
        Ok(())
    }
    
    async fn delete(&self, thread_id: &ThreadId) -> Result<()> {
        let removed = self.state.lock().await.threads.remove(thread_id);
        if removed.is_none() {
            return Err(StoreError::ThreadNotFound(thread_id.to_string()));
        }
        self.commit();
        Ok(())
    }
}
