pub mod message;
pub mod thread;

pub use message::MongoMessageRepository;
pub use thread::MongoThreadRepository;

use mongodb::bson::{doc, Bson, Document};

/// Update pipeline for an upsert that writes `fields` as-is and stamps
/// `created_at` with the server clock
///
/// Values go through `$literal` so user text starting with `$` is never
/// read as a field path.
pub(crate) fn server_stamped(fields: Document) -> Vec<Document> {
    let mut set = Document::new();
    for (key, value) in fields {
        set.insert(key, doc! { "$literal": value });
    }
    set.insert("created_at", "$$NOW");
    vec![doc! { "$set": set }]
}

/// Change-stream filter keeping events whose document has `field == value`
///
/// Deletes carry no document, so they always pass and trigger a re-query.
pub(crate) fn scoped_changes(field: &str, value: impl Into<Bson>) -> Vec<Document> {
    let mut scoped = Document::new();
    scoped.insert(format!("fullDocument.{}", field), value.into());
    let undocumented = doc! { "operationType": { "$nin": ["insert", "replace", "update"] } };
    vec![doc! { "$match": { "$or": [scoped, undocumented] } }]
}
