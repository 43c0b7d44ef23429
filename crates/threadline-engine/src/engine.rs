use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use threadline_llm::CompletionOracle;
use threadline_persist::{ImageRef, Message, NewMessage, StoreClient, Thread, ThreadId};

use crate::builder::EngineBuilder;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::listener::{Listener, LiveView};
use crate::session::Principal;
use crate::state::{Composer, SendOutcome, SendState};
use crate::title::TitleSynthesizer;

/// Who is signed in, what is selected, and the live listeners
#[derive(Default)]
struct Session {
    principal: Option<Principal>,
    selected: Option<ThreadId>,
    message_listener: Option<Listener>,
    thread_listener: Option<Listener>,
    selection_watch: Option<Listener>,
}

impl Session {
    fn owner_id(&self) -> Result<&str> {
        self.principal
            .as_ref()
            .map(|p| p.id.as_str())
            .ok_or(EngineError::Unauthenticated)
    }

    fn clear_selection(&mut self, messages: &LiveView<Message>) {
        if let Some(listener) = self.message_listener.take() {
            listener.cancel();
        }
        messages.reset();
        self.selected = None;
    }
}

/// Resets the composer and send state when a send ends, even if its future is dropped
struct SendGuard<'a> {
    composer: &'a watch::Sender<Composer>,
    state: &'a watch::Sender<SendState>,
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.composer.send_modify(Composer::reset);
        self.state.send_replace(SendState::Idle);
    }
}

/// Orchestrates thread creation, message persistence, completions and titles
///
/// The engine holds at most one live message listener (for the selected
/// thread) and one live thread-list listener (for the signed-in principal).
/// Both are replaced atomically with respect to their views: once a switch
/// returns, nothing from the previous listener is observed. Dropping the
/// engine aborts both.
pub struct SyncEngine {
    store: StoreClient,
    oracle: CompletionOracle,
    titles: TitleSynthesizer,
    config: EngineConfig,
    session: Arc<Mutex<Session>>,
    messages: Arc<LiveView<Message>>,
    threads: Arc<LiveView<Thread>>,
    state: watch::Sender<SendState>,
    composer: watch::Sender<Composer>,
}

impl SyncEngine {
    pub fn new(store: StoreClient, oracle: CompletionOracle, config: EngineConfig) -> Self {
        let titles = TitleSynthesizer::new(oracle.clone())
            .with_excerpt_chars(config.title_excerpt_chars);
        let (state, _) = watch::channel(SendState::Idle);
        let (composer, _) = watch::channel(Composer::default());

        Self {
            store,
            oracle,
            titles,
            config,
            session: Arc::new(Mutex::new(Session::default())),
            messages: LiveView::new(),
            threads: LiveView::new(),
            state,
            composer,
        }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    /// Messages of the selected thread, oldest first
    pub fn messages(&self) -> watch::Receiver<Vec<Message>> {
        self.messages.subscribe()
    }

    /// Threads of the signed-in principal, newest first
    pub fn threads(&self) -> watch::Receiver<Vec<Thread>> {
        self.threads.subscribe()
    }

    pub fn send_state(&self) -> watch::Receiver<SendState> {
        self.state.subscribe()
    }

    pub fn composer(&self) -> watch::Receiver<Composer> {
        self.composer.subscribe()
    }

    pub fn current_messages(&self) -> Vec<Message> {
        self.messages.snapshot()
    }

    pub fn current_threads(&self) -> Vec<Thread> {
        self.threads.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.composer.borrow().loading
    }

    pub async fn selected_thread(&self) -> Option<ThreadId> {
        self.session.lock().await.selected.clone()
    }

    pub async fn principal(&self) -> Option<Principal> {
        self.session.lock().await.principal.clone()
    }

    /// Replace the input draft
    pub fn compose(&self, text: impl Into<String>) {
        let text = text.into();
        self.composer.send_modify(|c| c.draft = text);
    }

    /// Attach an image reference to the next send
    pub fn attach_image(&self, image_ref: ImageRef) {
        self.composer.send_modify(|c| c.image_ref = Some(image_ref));
    }

    pub fn clear_image(&self) {
        self.composer.send_modify(|c| c.image_ref = None);
    }

    /// Follow the auth state
    ///
    /// A different principal (or none) drops the selection and both
    /// listeners; a new thread-list listener is attached for the new
    /// principal. The same id only refreshes the stored profile.
    pub async fn set_principal(&self, principal: Option<Principal>) -> Result<()> {
        let mut session = self.session.lock().await;

        let unchanged = session.principal.as_ref().map(|p| p.id.as_str())
            == principal.as_ref().map(|p| p.id.as_str());
        if unchanged && (principal.is_none() || session.thread_listener.is_some()) {
            session.principal = principal;
            return Ok(());
        }

        tracing::info!(
            principal = principal.as_ref().map(|p| p.id.as_str()).unwrap_or("<none>"),
            "Principal changed"
        );

        self.detach_messages(&mut session);
        session.principal = principal;
        self.attach_threads(&mut session).await
    }

    /// Make `thread_id` the active thread and follow its messages
    ///
    /// The thread must exist and belong to the signed-in principal. On
    /// error the previous selection is left as it was.
    pub async fn select_thread(&self, thread_id: ThreadId) -> Result<()> {
        let mut session = self.session.lock().await;
        let owner_id = session.owner_id()?.to_string();
        if session.selected.as_ref() == Some(&thread_id) && session.message_listener.is_some() {
            return Ok(());
        }

        self.owned_thread(&owner_id, &thread_id).await?;
        tracing::info!(thread_id = %thread_id, "Selecting thread");
        self.attach_messages(&mut session, thread_id).await
    }

    /// Return to the unselected state; the next send creates a thread
    pub async fn new_thread(&self) {
        let mut session = self.session.lock().await;
        self.detach_messages(&mut session);
        tracing::debug!("Cleared thread selection");
    }

    /// Delete every message of the thread, then the thread itself
    ///
    /// Only the owner may delete a thread. Nothing is rolled back if the
    /// first step fails; the thread record is kept so the deletion can be
    /// retried. A selected thread is deselected once both steps succeed.
    pub async fn delete_thread(&self, thread_id: &ThreadId) -> Result<()> {
        let owner_id = self.session.lock().await.owner_id()?.to_string();
        self.owned_thread(&owner_id, thread_id).await?;

        tracing::info!(thread_id = %thread_id, "Deleting thread");

        let removed = self
            .store
            .messages()
            .delete_all(thread_id)
            .await
            .map_err(|source| {
                tracing::error!(thread_id = %thread_id, "Failed to delete thread messages: {}", source);
                EngineError::DeletionIncomplete {
                    thread_id: thread_id.clone(),
                    source,
                }
            })?;

        match self.store.threads().delete(thread_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(thread_id = %thread_id, "Thread record already gone");
            }
            Err(source) => {
                tracing::error!(thread_id = %thread_id, "Failed to delete thread record: {}", source);
                return Err(EngineError::DeletionIncomplete {
                    thread_id: thread_id.clone(),
                    source,
                });
            }
        }

        let mut session = self.session.lock().await;
        if session.selected.as_ref() == Some(thread_id) {
            session.clear_selection(&self.messages);
        }

        tracing::info!(thread_id = %thread_id, removed, "Thread deleted");
        Ok(())
    }

    /// Compose `text` and send it along with any attached image
    pub async fn send_message(&self, text: impl Into<String>) -> Result<SendOutcome> {
        if self.is_loading() {
            return Ok(SendOutcome::Busy);
        }
        self.compose(text);
        self.submit().await
    }

    /// Send the current draft
    ///
    /// Store failures never surface as `Err`: they end the send with
    /// [`SendOutcome::Failed`] after writing a failure notice into the
    /// thread when one is known. The only error is a missing principal.
    pub async fn submit(&self) -> Result<SendOutcome> {
        let composer = self.composer.borrow().clone();
        if composer.loading {
            return Ok(SendOutcome::Busy);
        }
        if !composer.has_content() {
            tracing::debug!("Ignoring empty submission");
            return Ok(SendOutcome::Ignored);
        }

        let owner_id = self.session.lock().await.owner_id()?.to_string();

        let claimed = self.composer.send_if_modified(|c| {
            if c.loading {
                return false;
            }
            c.loading = true;
            true
        });
        if !claimed {
            return Ok(SendOutcome::Busy);
        }

        let _guard = SendGuard {
            composer: &self.composer,
            state: &self.state,
        };

        Ok(self.run_send(&owner_id, composer.draft, composer.image_ref).await)
    }

    /// Cancel both listeners and clear every view
    pub async fn shutdown(&self) {
        let mut session = self.session.lock().await;
        session.clear_selection(&self.messages);
        Self::detach_threads(&mut session);
        self.threads.reset();
        tracing::info!("Engine shut down");
    }

    async fn run_send(
        &self,
        owner_id: &str,
        text: String,
        image_ref: Option<ImageRef>,
    ) -> SendOutcome {
        self.enter(SendState::EnsuringThread);
        let (thread_id, created_thread) = match self.ensure_thread(owner_id).await {
            Ok(ensured) => ensured,
            Err(e) => {
                tracing::error!("Failed to ensure a thread: {}", e);
                return SendOutcome::Failed {
                    thread_id: None,
                    reason: e.to_string(),
                };
            }
        };

        self.enter(SendState::PersistingUserMessage);
        let has_image = image_ref.is_some();
        let user_message = NewMessage::user(text.clone(), image_ref);
        if let Err(e) = self.store.messages().append(&thread_id, user_message).await {
            tracing::error!(thread_id = %thread_id, "Failed to persist user message: {}", e);
            return self.fail(thread_id, e.to_string()).await;
        }

        self.enter(SendState::AwaitingCompletion);
        let prompt = self.config.build_prompt(&text, has_image);
        let reply = self.oracle.complete(&prompt).await;

        self.enter(SendState::PersistingAssistantMessage);
        let assistant_message = NewMessage::assistant(reply.clone());
        if let Err(e) = self.store.messages().append(&thread_id, assistant_message).await {
            tracing::error!(thread_id = %thread_id, "Failed to persist assistant message: {}", e);
            return self.fail(thread_id, e.to_string()).await;
        }

        if created_thread {
            self.enter(SendState::SynthesizingTitle);
            self.assign_title(&thread_id, &text, &reply).await;
        }

        SendOutcome::Completed {
            thread_id,
            created_thread,
        }
    }

    /// The selected thread if it still exists, otherwise a freshly created one
    async fn ensure_thread(&self, owner_id: &str) -> Result<(ThreadId, bool)> {
        let selected = self.session.lock().await.selected.clone();
        if let Some(thread_id) = selected {
            if self.store.threads().get(&thread_id).await?.is_some() {
                return Ok((thread_id, false));
            }

            tracing::warn!(thread_id = %thread_id, "Selected thread no longer exists, starting a new one");
            let mut session = self.session.lock().await;
            if session.selected.as_ref() == Some(&thread_id) {
                session.clear_selection(&self.messages);
            }
        }

        let thread_id = self.store.threads().create(owner_id).await?;
        tracing::info!(thread_id = %thread_id, "Created thread");
        self.follow_new_thread(&thread_id).await;
        Ok((thread_id, true))
    }

    /// Fetch a thread and check that `owner_id` owns it
    async fn owned_thread(&self, owner_id: &str, thread_id: &ThreadId) -> Result<Thread> {
        let thread = self
            .store
            .threads()
            .get(thread_id)
            .await?
            .ok_or_else(|| EngineError::ThreadNotFound(thread_id.clone()))?;

        if thread.owner_id != owner_id {
            tracing::warn!(thread_id = %thread_id, principal = owner_id, "Refusing access to foreign thread");
            return Err(EngineError::NotOwner {
                thread_id: thread_id.clone(),
                principal: owner_id.to_string(),
            });
        }
        Ok(thread)
    }

    fn enter(&self, state: SendState) {
        tracing::debug!(state = %state, "Send state");
        self.state.send_replace(state);
    }

    /// Select a thread created by this send so its messages show up live
    async fn follow_new_thread(&self, thread_id: &ThreadId) {
        let mut session = self.session.lock().await;
        if let Err(e) = self.attach_messages(&mut session, thread_id.clone()).await {
            tracing::warn!(thread_id = %thread_id, "Failed to follow new thread: {}", e);
        }
    }

    async fn fail(&self, thread_id: ThreadId, reason: String) -> SendOutcome {
        let notice = NewMessage::assistant(self.config.failure_text.clone());
        if let Err(e) = self.store.messages().append(&thread_id, notice).await {
            tracing::error!(thread_id = %thread_id, "Failed to persist failure notice: {}", e);
        }
        SendOutcome::Failed {
            thread_id: Some(thread_id),
            reason,
        }
    }

    async fn assign_title(&self, thread_id: &ThreadId, first_message: &str, reply: &str) {
        let title = self.titles.synthesize(first_message, reply).await;
        if title.is_empty() {
            tracing::debug!(thread_id = %thread_id, "No title could be derived, keeping placeholder");
            return;
        }

        match self.store.threads().set_title(thread_id, &title).await {
            Ok(()) => tracing::info!(thread_id = %thread_id, title = %title, "Thread titled"),
            Err(e) if e.is_not_found() => {
                tracing::debug!(thread_id = %thread_id, "Thread deleted before it was titled");
            }
            Err(e) => tracing::warn!(thread_id = %thread_id, "Failed to write thread title: {}", e),
        }
    }

    fn detach_messages(&self, session: &mut Session) {
        session.clear_selection(&self.messages);
    }

    fn detach_threads(session: &mut Session) {
        if let Some(watch) = session.selection_watch.take() {
            watch.cancel();
        }
        if let Some(listener) = session.thread_listener.take() {
            listener.cancel();
        }
    }

    /// Swap the message listener; the old one stays if subscribing fails
    async fn attach_messages(&self, session: &mut Session, thread_id: ThreadId) -> Result<()> {
        let subscription = self.store.messages().subscribe(&thread_id).await?;

        session.clear_selection(&self.messages);
        let generation = self.messages.generation();
        session.message_listener = Some(Listener::spawn(
            format!("messages:{}", thread_id),
            Arc::clone(&self.messages),
            generation,
            subscription,
            Message::sort_chronologically,
        ));
        session.selected = Some(thread_id);
        Ok(())
    }

    async fn attach_threads(&self, session: &mut Session) -> Result<()> {
        Self::detach_threads(session);
        let generation = self.threads.reset();

        let Some(owner_id) = session.principal.as_ref().map(|p| p.id.clone()) else {
            return Ok(());
        };
        let subscription = self.store.threads().subscribe(&owner_id).await?;
        session.thread_listener = Some(Listener::spawn(
            format!("threads:{}", owner_id),
            Arc::clone(&self.threads),
            generation,
            subscription,
            Thread::sort_newest_first,
        ));
        session.selection_watch = Some(self.watch_selection(&owner_id));
        Ok(())
    }

    /// Clear the selection when its thread is deleted elsewhere
    ///
    /// A thread missing from the list may simply not be listed yet, so the
    /// registry decides.
    fn watch_selection(&self, owner_id: &str) -> Listener {
        let session = Arc::downgrade(&self.session);
        let messages = Arc::clone(&self.messages);
        let registry = Arc::clone(self.store.threads());
        let mut threads = self.threads.subscribe();

        let task = tokio::spawn(async move {
            while threads.changed().await.is_ok() {
                let listed: Vec<ThreadId> = threads
                    .borrow_and_update()
                    .iter()
                    .map(|t| t.id.clone())
                    .collect();
                let Some(shared) = session.upgrade() else {
                    break;
                };
                let Some(selected) = shared.lock().await.selected.clone() else {
                    continue;
                };
                if listed.contains(&selected) {
                    continue;
                }

                match registry.get(&selected).await {
                    Ok(None) => {
                        let mut guard = shared.lock().await;
                        if guard.selected.as_ref() == Some(&selected) {
                            tracing::info!(thread_id = %selected, "Selected thread was removed, clearing selection");
                            guard.clear_selection(&messages);
                        }
                    }
                    Ok(Some(_)) => {}
                    Err(e) => {
                        tracing::warn!(thread_id = %selected, "Failed to check selected thread: {}", e);
                    }
                }
            }
        });

        Listener::from_task(format!("selection:{}", owner_id), task)
    }
}
