use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::thread::ThreadId;
use crate::error::{Result, StoreError};

/// Opaque message identifier assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to previously uploaded image content (a URL-like string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }
    
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => f.write_str("user"),
            Sender::Assistant => f.write_str("assistant"),
        }
    }
}

/// A persisted turn of a thread; never mutated after it is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Non-owning back-reference; the store does not enforce that the thread exists
    pub thread_id: ThreadId,
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<ImageRef>,
    /// Server-assigned; sole ordering key within a thread (ascending)
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Oldest first, ties broken by id so the order is total
    pub fn sort_chronologically(messages: &mut [Message]) {
        messages.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}

/// Message payload before the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender: Sender,
    pub text: String,
    pub image_ref: Option<ImageRef>,
}

impl NewMessage {
    pub fn user(text: impl Into<String>, image_ref: Option<ImageRef>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            image_ref,
        }
    }
    
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            image_ref: None,
        }
    }
    
    /// Text may be empty only when an image reference is attached
    pub fn validate(&self) -> Result<()> {
        if self.text.is_empty() && self.image_ref.is_none() {
            return Err(StoreError::InvalidMessage(
                "message text is empty and no image is attached".to_string(),
            ));
        }
        Ok(())
    }
    
    pub(crate) fn into_message(
        self,
        id: MessageId,
        thread_id: ThreadId,
        created_at: DateTime<Utc>,
    ) -> Message {
        Message {
            id,
            thread_id,
            sender: self.sender,
            text: self.text,
            image_ref: self.image_ref,
            created_at,
        }
    }
}
