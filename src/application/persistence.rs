use tracing::{debug, info, warn};

use crate::storage::{Document, DocumentStore, transaction_document};

use super::{AppError, SynthesisBatch};

/// Counts from a completed replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaceOutcome {
    pub deleted: u64,
    pub inserted: u64,
}

/// Replace everything in `collection` with `chunks`, one `insert_many` per chunk.
///
/// If the delete fails nothing is inserted and the old documents stay. If an
/// insert fails, the chunks written before it remain in the collection and
/// the error reports how many records made it.
pub async fn replace_collection<S: DocumentStore>(
    store: &S,
    collection: &str,
    chunks: Vec<Vec<Document>>,
) -> Result<ReplaceOutcome, AppError> {
    let total: u64 = chunks.iter().map(|c| c.len() as u64).sum();

    let deleted = store
        .delete_all(collection)
        .await
        .map_err(|source| AppError::ReplaceAborted {
            collection: collection.to_string(),
            source,
        })?;
    debug!(collection, deleted, "cleared collection");

    let mut inserted = 0;
    for chunk in chunks.iter().filter(|c| !c.is_empty()) {
        match store.insert_many(collection, chunk).await {
            Ok(written) => inserted += written,
            Err(source) => {
                warn!(collection, inserted, total, "replacement left partially written");
                return Err(AppError::PartialReplace {
                    collection: collection.to_string(),
                    inserted,
                    total,
                    source,
                });
            }
        }
    }

    info!(collection, deleted, inserted, "replaced collection");
    Ok(ReplaceOutcome { deleted, inserted })
}

/// Persist a synthesis batch, one insert per synthesized day.
pub async fn replace_with_batch<S: DocumentStore>(
    store: &S,
    collection: &str,
    batch: &SynthesisBatch,
) -> Result<ReplaceOutcome, AppError> {
    let chunks = batch
        .daily_chunks()
        .map(|day| {
            day.iter()
                .map(transaction_document)
                .collect::<anyhow::Result<Vec<Document>>>()
        })
        .collect::<anyhow::Result<Vec<Vec<Document>>>>()?;

    replace_collection(store, collection, chunks).await
}
