pub mod models;
pub mod store;
pub mod subscription;
pub mod dbs;
pub mod client;
pub mod error;
pub mod builder;

pub use models::{
    ImageRef, Message, MessageId, NewMessage, Sender, Thread, ThreadId, PLACEHOLDER_TITLE,
};
pub use store::{MessageStore, ThreadRegistry};
pub use subscription::Subscription;
pub use dbs::memory::InMemoryStore;
pub use client::StoreClient;
pub use error::{Result, StoreError};
pub use builder::StoreClientBuilder;

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoStore;
