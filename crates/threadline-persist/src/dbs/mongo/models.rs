use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::{ImageRef, Message, MessageId, Sender, Thread, ThreadId};

/// MongoDB-specific Thread model (uses ObjectId)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
}

/// MongoDB-specific Message model (uses ObjectId)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub thread_id: ObjectId,
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

// Conversions from MongoDB-specific to database-agnostic models

impl From<MongoThread> for Thread {
    fn from(thread: MongoThread) -> Self {
        Self {
            id: ThreadId::new(thread.id.to_hex()),
            title: thread.title,
            created_at: thread.created_at,
            owner_id: thread.owner_id,
        }
    }
}

impl From<MongoMessage> for Message {
    fn from(msg: MongoMessage) -> Self {
        Self {
            id: MessageId::new(msg.id.to_hex()),
            thread_id: ThreadId::new(msg.thread_id.to_hex()),
            sender: msg.sender,
            text: msg.text,
            image_ref: msg.image_ref.map(ImageRef::new),
            created_at: msg.created_at,
        }
    }
}
