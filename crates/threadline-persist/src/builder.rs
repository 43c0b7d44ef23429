use crate::client::StoreClient;
use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    MongoDb,
}

pub struct StoreClientBuilder {
    backend: Backend,
    mongodb_uri: Option<String>,
    database: Option<String>,
}

impl StoreClientBuilder {
    pub fn new() -> Self {
        Self {
            backend: Backend::Memory,
            mongodb_uri: None,
            database: None,
        }
    }
    
    pub fn in_memory(mut self) -> Self {
        self.backend = Backend::Memory;
        self
    }
    
    /// Select the MongoDB backend
    pub fn mongodb_uri(mut self, uri: impl Into<String>) -> Self {
        self.backend = Backend::MongoDb;
        self.mongodb_uri = Some(uri.into());
        self
    }
    
    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }
    
    pub async fn build(self) -> Result<StoreClient> {
        match self.backend {
            Backend::Memory => Ok(StoreClient::in_memory()),
            Backend::MongoDb => {
                let mongodb_uri = self.mongodb_uri
                    .ok_or_else(|| StoreError::Config("mongodb_uri is required".to_string()))?;
                let database = self.database
                    .ok_or_else(|| StoreError::Config("database is required".to_string()))?;
                Self::connect_mongodb(&mongodb_uri, &database).await
            }
        }
    }
    
    #[cfg(feature = "mongodb")]
    async fn connect_mongodb(uri: &str, database: &str) -> Result<StoreClient> {
        let store = std::sync::Arc::new(crate::dbs::mongo::MongoStore::connect(uri, database).await?);
        Ok(StoreClient::new(store.clone(), store, "mongodb"))
    }
    
    #[cfg(not(feature = "mongodb"))]
    async fn connect_mongodb(_uri: &str, _database: &str) -> Result<StoreClient> {
        Err(StoreError::Config(
            "threadline-persist was built without the `mongodb` feature".to_string(),
        ))
    }
}

impl Default for StoreClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
