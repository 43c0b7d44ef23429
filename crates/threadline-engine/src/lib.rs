pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod listener;
pub mod session;
pub mod state;
pub mod title;

pub use builder::EngineBuilder;
pub use config::EngineConfig;
pub use engine::SyncEngine;
pub use error::{EngineError, Result};
pub use session::Principal;
pub use state::{Composer, SendOutcome, SendState};
pub use title::{heuristic_title, TitleSynthesizer};
