pub mod client;
pub mod models;
pub mod repositories;

pub use client::MongoStore;
pub use models::{MongoMessage, MongoThread};
