#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;

use threadline_engine::{EngineConfig, Principal, SyncEngine};
use threadline_llm::{CompletionClient, CompletionOracle, GenerateRequest, GenerateResponse};
use threadline_persist::{
    InMemoryStore, Message, MessageId, MessageStore, NewMessage, StoreClient, StoreError,
    Subscription, Thread, ThreadId, ThreadRegistry,
};

pub const TITLE_PROMPT_PREFIX: &str = "Based on this conversation";

type Responder = Box<dyn Fn(&str) -> Result<Option<String>> + Send + Sync>;

/// Completion client answering through a closure and recording every prompt
pub struct ScriptedClient {
    respond: Responder,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(
        respond: impl Fn(&str) -> Result<Option<String>> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Answers chat prompts with `reply` and title prompts with `title`
    pub fn replying(reply: &'static str, title: &'static str) -> Arc<Self> {
        Self::new(move |prompt| {
            if prompt.starts_with(TITLE_PROMPT_PREFIX) {
                Ok(Some(title.to_string()))
            } else {
                Ok(Some(reply.to_string()))
            }
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn title_prompts(&self) -> usize {
        self.prompts()
            .iter()
            .filter(|p| p.starts_with(TITLE_PROMPT_PREFIX))
            .count()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let text = (self.respond)(&request.prompt)?;
        Ok(GenerateResponse {
            text,
            finish_reason: None,
            usage: None,
            raw: serde_json::Value::Null,
        })
    }

    fn provider_name(&self) -> &str {
        "Scripted"
    }
}

/// In-memory store with switchable failures and call counters
#[derive(Default)]
pub struct FaultyStore {
    pub inner: InMemoryStore,
    pub fail_create: AtomicBool,
    pub fail_user_append: AtomicBool,
    pub fail_assistant_append: AtomicBool,
    pub fail_message_delete: AtomicBool,
    pub fail_message_subscribe: AtomicBool,
    pub title_not_found: AtomicBool,
    pub set_title_calls: AtomicUsize,
    pub message_subscriptions: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn client(self: &Arc<Self>) -> StoreClient {
        StoreClient::new(self.clone(), self.clone(), "faulty")
    }

    pub fn fail(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }
}

fn unavailable(what: &str) -> StoreError {
    StoreError::Unavailable(format!("{} failed", what))
}

#[async_trait]
impl MessageStore for FaultyStore {
    async fn append(&self, thread_id: &ThreadId, message: NewMessage) -> threadline_persist::Result<MessageId> {
        let flag = match message.sender {
            threadline_persist::Sender::User => &self.fail_user_append,
            threadline_persist::Sender::Assistant => &self.fail_assistant_append,
        };
        if flag.load(Ordering::SeqCst) {
            return Err(unavailable("append"));
        }
        self.inner.append(thread_id, message).await
    }

    async fn list(&self, thread_id: &ThreadId) -> threadline_persist::Result<Vec<Message>> {
        MessageStore::list(&self.inner, thread_id).await
    }

    async fn subscribe(&self, thread_id: &ThreadId) -> threadline_persist::Result<Subscription<Message>> {
        self.message_subscriptions.fetch_add(1, Ordering::SeqCst);
        if self.fail_message_subscribe.load(Ordering::SeqCst) {
            return Err(unavailable("subscribe"));
        }
        MessageStore::subscribe(&self.inner, thread_id).await
    }

    async fn delete(&self, thread_id: &ThreadId, message_id: &MessageId) -> threadline_persist::Result<()> {
        if self.fail_message_delete.load(Ordering::SeqCst) {
            return Err(unavailable("delete"));
        }
        MessageStore::delete(&self.inner, thread_id, message_id).await
    }
}

#[async_trait]
impl ThreadRegistry for FaultyStore {
    async fn create(&self, owner_id: &str) -> threadline_persist::Result<ThreadId> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(unavailable("create"));
        }
        self.inner.create(owner_id).await
    }

    async fn get(&self, thread_id: &ThreadId) -> threadline_persist::Result<Option<Thread>> {
        self.inner.get(thread_id).await
    }

    async fn list(&self, owner_id: &str) -> threadline_persist::Result<Vec<Thread>> {
        ThreadRegistry::list(&self.inner, owner_id).await
    }

    async fn subscribe(&self, owner_id: &str) -> threadline_persist::Result<Subscription<Thread>> {
        ThreadRegistry::subscribe(&self.inner, owner_id).await
    }

    async fn set_title(&self, thread_id: &ThreadId, title: &str) -> threadline_persist::Result<()> {
        self.set_title_calls.fetch_add(1, Ordering::SeqCst);
        if self.title_not_found.load(Ordering::SeqCst) {
            return Err(StoreError::ThreadNotFound(thread_id.to_string()));
        }
        self.inner.set_title(thread_id, title).await
    }

    async fn delete(&self, thread_id: &ThreadId) -> threadline_persist::Result<()> {
        ThreadRegistry::delete(&self.inner, thread_id).await
    }
}

/// Message store that delivers every snapshot in reverse order
pub struct ReversingStore {
    pub inner: InMemoryStore,
}

#[async_trait]
impl MessageStore for ReversingStore {
    async fn append(&self, thread_id: &ThreadId, message: NewMessage) -> threadline_persist::Result<MessageId> {
        self.inner.append(thread_id, message).await
    }

    async fn list(&self, thread_id: &ThreadId) -> threadline_persist::Result<Vec<Message>> {
        MessageStore::list(&self.inner, thread_id).await
    }

    async fn subscribe(&self, thread_id: &ThreadId) -> threadline_persist::Result<Subscription<Message>> {
        let mut upstream = MessageStore::subscribe(&self.inner, thread_id).await?;
        let (tx, subscription) = Subscription::channel();
        let task = tokio::spawn(async move {
            while let Some(mut snapshot) = upstream.next().await {
                snapshot.reverse();
                if tx.send(snapshot).is_err() {
                    break;
                }
            }
        });
        Ok(subscription.attach(task))
    }

    async fn delete(&self, thread_id: &ThreadId, message_id: &MessageId) -> threadline_persist::Result<()> {
        MessageStore::delete(&self.inner, thread_id, message_id).await
    }
}

pub fn alice() -> Principal {
    Principal::new("alice").with_display_name("Alice")
}

pub fn engine_with(store: StoreClient, client: Arc<ScriptedClient>) -> SyncEngine {
    SyncEngine::builder()
        .store(store)
        .oracle(CompletionOracle::new(client))
        .config(EngineConfig::default())
        .build()
        .unwrap()
}

/// Engine over a fresh in-memory store with `alice` signed in
pub async fn signed_in_engine(client: Arc<ScriptedClient>) -> (SyncEngine, InMemoryStore) {
    let store = InMemoryStore::new();
    let engine = engine_with(
        StoreClient::new(Arc::new(store.clone()), Arc::new(store.clone()), "memory"),
        client,
    );
    engine.set_principal(Some(alice())).await.unwrap();
    (engine, store)
}

/// Poll the engine until nothing is selected
pub async fn wait_for_deselection(engine: &SyncEngine) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while engine.selected_thread().await.is_some() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("selection was never cleared");
}

/// Wait until the watched value satisfies `pred`
pub async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, pred: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
        .await
        .expect("timed out waiting for view")
        .expect("view sender dropped")
        .clone()
}
