mod message;
mod thread;

pub use message::{ImageRef, Message, MessageId, NewMessage, Sender};
pub use thread::{Thread, ThreadId, PLACEHOLDER_TITLE};
