use std::future::Future;

use anyhow::Result;

/// A stored document. Bodies are free-form JSON objects.
pub type Document = serde_json::Value;

/// A document sink addressed by collection name.
///
/// Operations on different collections are independent and nothing here is
/// transactional across calls.
pub trait DocumentStore {
    /// Remove every document in `collection`, returning how many were removed.
    fn delete_all(&self, collection: &str) -> impl Future<Output = Result<u64>> + Send;

    /// Append `documents` to `collection` in order, returning how many were written.
    fn insert_many(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> impl Future<Output = Result<u64>> + Send;

    /// All documents in `collection`, in insertion order.
    fn find_all(&self, collection: &str) -> impl Future<Output = Result<Vec<Document>>> + Send;
}
