use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Any transport, read or write failure of the backing store
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    
    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),
    
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),
    
    #[error("Message not found: {0}")]
    MessageNotFound(String),
    
    #[error("Invalid id: {0}")]
    InvalidId(String),
    
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
    
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::ThreadNotFound(_) | StoreError::MessageNotFound(_))
    }
    
    /// True for failures of the store itself, as opposed to bad input
    pub fn is_unavailable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            #[cfg(feature = "mongodb")]
            StoreError::Database(_) | StoreError::BsonSerialization(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
