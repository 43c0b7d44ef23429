use futures::TryStreamExt;
use mongodb::change_stream::event::ChangeStreamEvent;
use mongodb::change_stream::ChangeStream;
use mongodb::options::FullDocumentType;
use mongodb::{bson::doc, bson::oid::ObjectId, Client, Collection};

use super::{scoped_changes, server_stamped};
use crate::dbs::mongo::models::MongoThread;
use crate::error::Result;
use crate::models::PLACEHOLDER_TITLE;

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }
    
    /// Create a new thread with the placeholder title; the server assigns `created_at`
    pub async fn create_thread(&self, owner_id: &str) -> Result<ObjectId> {
        let id = ObjectId::new();
        let fields = doc! { "title": PLACEHOLDER_TITLE, "owner_id": owner_id };
        
        self.collection
            .update_one(doc! { "_id": id }, server_stamped(fields))
            .upsert(true)
            .await?;
        Ok(id)
    }
    
    /// Get thread by ID
    pub async fn get_thread(&self, thread_id: ObjectId) -> Result<Option<MongoThread>> {
        let filter = doc! { "_id": thread_id };
        Ok(self.collection.find_one(filter).await?)
    }
    
    /// List threads for an owner, newest first
    pub async fn list_threads(&self, owner_id: &str) -> Result<Vec<MongoThread>> {
        let filter = doc! { "owner_id": owner_id };
        let threads = self.collection
            .find(filter)
            .sort(doc! { "created_at": -1, "_id": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(threads)
    }
    
    /// Overwrite the title, returning how many documents matched
    pub async fn update_title(&self, thread_id: ObjectId, title: &str) -> Result<u64> {
        let filter = doc! { "_id": thread_id };
        let update = doc! { "$set": { "title": title } };
        Ok(self.collection.update_one(filter, update).await?.matched_count)
    }
    
    /// Delete thread, returning how many documents were removed
    pub async fn delete_thread(&self, thread_id: ObjectId) -> Result<u64> {
        let filter = doc! { "_id": thread_id };
        Ok(self.collection.delete_one(filter).await?.deleted_count)
    }
    
    /// Open a change stream over one owner's threads (requires a replica set)
    ///
    /// Title updates are looked up in full so they can be matched by owner.
    pub async fn watch_owner(
        &self,
        owner_id: &str,
    ) -> Result<ChangeStream<ChangeStreamEvent<MongoThread>>> {
        Ok(self
            .collection
            .watch()
            .pipeline(scoped_changes("owner_id", owner_id))
            .full_document(FullDocumentType::UpdateLookup)
            .await?)
    }
}
