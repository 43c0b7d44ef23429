use futures::TryStreamExt;
use mongodb::change_stream::event::ChangeStreamEvent;
use mongodb::change_stream::ChangeStream;
use mongodb::options::FullDocumentType;
use mongodb::{bson::doc, bson::oid::ObjectId, bson::Document, Client, Collection};

use super::{scoped_changes, server_stamped};
use crate::dbs::mongo::models::MongoMessage;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }
    
    /// Insert a message under `id`; the server assigns `created_at`
    pub async fn insert_message(&self, id: ObjectId, fields: Document) -> Result<ObjectId> {
        self.collection
            .update_one(doc! { "_id": id }, server_stamped(fields))
            .upsert(true)
            .await?;
        Ok(id)
    }
    
    /// Get all messages for a thread, oldest first
    pub async fn get_messages(&self, thread_id: ObjectId) -> Result<Vec<MongoMessage>> {
        let filter = doc! { "thread_id": thread_id };
        let messages = self.collection
            .find(filter)
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }
    
    /// Delete one message, returning how many documents matched
    pub async fn delete_message(&self, thread_id: ObjectId, message_id: ObjectId) -> Result<u64> {
        let filter = doc! { "_id": message_id, "thread_id": thread_id };
        Ok(self.collection.delete_one(filter).await?.deleted_count)
    }
    
    /// Delete every message of a thread in one bulk operation
    pub async fn delete_for_thread(&self, thread_id: ObjectId) -> Result<u64> {
        let filter = doc! { "thread_id": thread_id };
        Ok(self.collection.delete_many(filter).await?.deleted_count)
    }
    
    /// Open a change stream over one thread's messages (requires a replica set)
    pub async fn watch_thread(
        &self,
        thread_id: ObjectId,
    ) -> Result<ChangeStream<ChangeStreamEvent<MongoMessage>>> {
        Ok(self
            .collection
            .watch()
            .pipeline(scoped_changes("thread_id", thread_id))
            .full_document(FullDocumentType::UpdateLookup)
            .await?)
    }
}
