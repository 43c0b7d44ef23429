use std::fmt;

use threadline_persist::{ImageRef, ThreadId};

/// Phase of the send currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    EnsuringThread,
    PersistingUserMessage,
    AwaitingCompletion,
    PersistingAssistantMessage,
    SynthesizingTitle,
}

impl fmt::Display for SendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SendState::Idle => "idle",
            SendState::EnsuringThread => "ensuring_thread",
            SendState::PersistingUserMessage => "persisting_user_message",
            SendState::AwaitingCompletion => "awaiting_completion",
            SendState::PersistingAssistantMessage => "persisting_assistant_message",
            SendState::SynthesizingTitle => "synthesizing_title",
        };
        f.write_str(name)
    }
}

/// How a send ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send: blank text and no image
    Ignored,
    /// Another send is still running
    Busy,
    /// User and assistant messages were both persisted
    Completed {
        thread_id: ThreadId,
        created_thread: bool,
    },
    /// A store write failed; a failure notice was attempted when the thread is known
    Failed {
        thread_id: Option<ThreadId>,
        reason: String,
    },
}

impl SendOutcome {
    pub fn thread_id(&self) -> Option<&ThreadId> {
        match self {
            SendOutcome::Completed { thread_id, .. } => Some(thread_id),
            SendOutcome::Failed { thread_id, .. } => thread_id.as_ref(),
            _ => None,
        }
    }
    
    pub fn is_completed(&self) -> bool {
        matches!(self, SendOutcome::Completed { .. })
    }
}

/// Input draft and loading indicator owned by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    pub draft: String,
    pub image_ref: Option<ImageRef>,
    pub loading: bool,
}

impl Composer {
    /// Blank text with no image is not sendable
    pub fn has_content(&self) -> bool {
        !self.draft.trim().is_empty() || self.image_ref.is_some()
    }
    
    /// Guaranteed cleanup after every send
    pub(crate) fn reset(&mut self) {
        self.draft.clear();
        self.image_ref = None;
        self.loading = false;
    }
}
