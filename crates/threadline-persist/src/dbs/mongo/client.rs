use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::change_stream::ChangeStream;
use mongodb::Client;
use serde::de::DeserializeOwned;

use crate::dbs::mongo::repositories::{MongoMessageRepository, MongoThreadRepository};
use crate::error::{Result, StoreError};
use crate::models::{Message, MessageId, NewMessage, Thread, ThreadId};
use crate::store::{MessageStore, ThreadRegistry};
use crate::subscription::Subscription;

type LiveQuery<T> = Box<dyn Fn() -> BoxFuture<'static, Result<Vec<T>>> + Send + Sync>;

/// Thread registry and message store backed by MongoDB
///
/// Live subscriptions rely on change streams, so the deployment must be a
/// replica set (a single-node replica set is enough).
pub struct MongoStore {
    message_repo: MongoMessageRepository,
    thread_repo: MongoThreadRepository,
}

impl MongoStore {
    /// Connect to MongoDB and create store
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        
        let message_repo = MongoMessageRepository::new(&client, database);
        let thread_repo = MongoThreadRepository::new(&client, database);
        
        tracing::info!(database, "Connected to MongoDB");
        Ok(Self {
            message_repo,
            thread_repo,
        })
    }
}

fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|e| StoreError::InvalidId(format!("{}: {}", id, e)))
}

/// Re-run `query` after every change-stream event, forwarding changed results
fn spawn_live_query<T, E>(changes: ChangeStream<E>, query: LiveQuery<T>) -> Subscription<T>
where
    T: Clone + PartialEq + Send + 'static,
    E: DeserializeOwned + Unpin + Send + Sync + 'static,
{
    let (tx, subscription) = Subscription::channel();
    
    let task = tokio::spawn(async move {
        let mut changes = Box::pin(changes);
        let mut last: Option<Vec<T>> = None;
        loop {
            match query().await {
                Ok(snapshot) => {
                    if last.as_ref() != Some(&snapshot) {
                        if tx.send(snapshot.clone()).is_err() {
                            break;
                        }
                        last = Some(snapshot);
                    }
                }
                Err(e) => tracing::warn!("Live query failed: {}", e),
            }
            
            match changes.next().await {
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("Change stream failed: {}", e);
                    break;
                }
                None => break,
            }
        }
    });
    
    subscription.attach(task)
}

#[async_trait]
impl MessageStore for MongoStore {
    async fn append(&self, thread_id: &ThreadId, message: NewMessage) -> Result<MessageId> {
        message.validate()?;
        let thread_oid = parse_id(thread_id.as_str())?;
        
        let mut fields = doc! {
            "thread_id": thread_oid,
            "sender": bson::to_bson(&message.sender)?,
            "text": message.text,
        };
        if let Some(image_ref) = message.image_ref {
            fields.insert("image_ref", image_ref.as_str());
        }
        
        let id = self.message_repo.insert_message(ObjectId::new(), fields).await?;
        Ok(MessageId::new(id.to_hex()))
    }
    
    async fn list(&self, thread_id: &ThreadId) -> Result<Vec<Message>> {
        let thread_oid = parse_id(thread_id.as_str())?;
        let messages = self.message_repo.get_messages(thread_oid).await?;
        Ok(messages.into_iter().map(Message::from).collect())
    }
    
    async fn subscribe(&self, thread_id: &ThreadId) -> Result<Subscription<Message>> {
        let thread_oid = parse_id(thread_id.as_str())?;
        // Open the stream before the first query so no commit falls in between
        let changes = self.message_repo.watch_thread(thread_oid).await?;
        
        let repo = self.message_repo.clone();
        let query: LiveQuery<Message> = Box::new(move || {
            let repo = repo.clone();
            async move {
                let messages = repo.get_messages(thread_oid).await?;
                Ok::<_, StoreError>(messages.into_iter().map(Message::from).collect::<Vec<_>>())
            }
            .boxed()
        });
        
        Ok(spawn_live_query(changes, query))
    }
    
    async fn delete(&self, thread_id: &ThreadId, message_id: &MessageId) -> Result<()> {
        let thread_oid = parse_id(thread_id.as_str())?;
        let message_oid = parse_id(message_id.as_str())?;
        
        if self.message_repo.delete_message(thread_oid, message_oid).await? == 0 {
            return Err(StoreError::MessageNotFound(message_id.to_string()));
        }
        Ok(())
    }
    
    // Single delete_many instead of list-then-delete-each
    async fn delete_all(&self, thread_id: &ThreadId) -> Result<usize> {
        let thread_oid = parse_id(thread_id.as_str())?;
        let deleted = self.message_repo.delete_for_thread(thread_oid).await?;
        Ok(deleted as usize)
    }
}

#[async_trait]
impl ThreadRegistry for MongoStore {
    async fn create(&self, owner_id: &str) -> Result<ThreadId> {
        let id = self.thread_repo.create_thread(owner_id).await?;
        Ok(ThreadId::new(id.to_hex()))
    }
    
    async fn get(&self, thread_id: &ThreadId) -> Result<Option<Thread>> {
        let thread_oid = parse_id(thread_id.as_str())?;
        let thread = self.thread_repo.get_thread(thread_oid).await?;
        Ok(thread.map(Thread::from))
    }
    
    async fn list(&self, owner_id: &str) -> Result<Vec<Thread>> {
        let threads = self.thread_repo.list_threads(owner_id).await?;
        Ok(threads.into_iter().map(Thread::from).collect())
    }
    
    async fn subscribe(&self, owner_id: &str) -> Result<Subscription<Thread>> {
        let changes = self.thread_repo.watch_owner(owner_id).await?;
        
        let repo = self.thread_repo.clone();
        let owner_id = owner_id.to_string();
        let query: LiveQuery<Thread> = Box::new(move || {
            let repo = repo.clone();
            let owner_id = owner_id.clone();
            async move {
                let threads = repo.list_threads(&owner_id).await?;
                Ok::<_, StoreError>(threads.into_iter().map(Thread::from).collect::<Vec<_>>())
            }
            .boxed()
        });
        
        Ok(spawn_live_query(changes, query))
    }
    
    async fn set_title(&self, thread_id: &ThreadId, title: &str) -> Result<()> {
        let thread_oid = parse_id(thread_id.as_str())?;
        if self.thread_repo.update_title(thread_oid, title).await? == 0 {
            return Err(StoreError::ThreadNotFound(thread_id.to_string()));
        }
        Ok(())
    }
    
    async fn delete(&self, thread_id: &ThreadId) -> Result<()> {
        let thread_oid = parse_id(thread_id.as_str())?;
        if self.thread_repo.delete_thread(thread_oid).await? == 0 {
            return Err(StoreError::ThreadNotFound(thread_id.to_string()));
        }
        Ok(())
    }
}
