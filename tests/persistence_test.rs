mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, bail};
use common::{forecast, parse_date, test_config, test_service, weekly_forecast};
use serde_json::json;
use txsynth::application::{
    AppError, SynthesisService, Synthesizer, replace_collection, replace_with_batch,
};
use txsynth::domain::{DegenerateDrawPolicy, ForecastRecord, SyntheticTransaction};
use txsynth::storage::{Document, DocumentStore, MemoryStore, transaction_from_document};

/// Wraps a memory store and fails on demand.
#[derive(Clone, Default)]
struct FaultyStore {
    inner: MemoryStore,
    fail_delete: Arc<AtomicBool>,
    /// Number of successful inserts allowed before every further insert fails.
    inserts_left: Arc<AtomicUsize>,
}

impl FaultyStore {
    fn new() -> Self {
        let store = Self::default();
        store.inserts_left.store(usize::MAX, Ordering::SeqCst);
        store
    }

    fn fail_delete(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    fn allow_inserts(&self, n: usize) {
        self.inserts_left.store(n, Ordering::SeqCst);
    }
}

impl DocumentStore for FaultyStore {
    async fn delete_all(&self, collection: &str) -> Result<u64> {
        if self.fail_delete.load(Ordering::SeqCst) {
            bail!("delete refused for '{}'", collection);
        }
        self.inner.delete_all(collection).await
    }

    async fn insert_many(&self, collection: &str, documents: &[Document]) -> Result<u64> {
        let allowed = self
            .inserts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if allowed.is_err() {
            bail!("insert refused for '{}'", collection);
        }
        self.inner.insert_many(collection, documents).await
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        self.inner.find_all(collection).await
    }
}

fn three_day_series() -> Vec<ForecastRecord> {
    vec![
        ForecastRecord::new(parse_date("2024-04-01"), 5.0, 500.0),
        ForecastRecord::new(parse_date("2024-04-02"), 6.0, 600.0),
        ForecastRecord::new(parse_date("2024-04-03"), 7.0, 700.0),
    ]
}

#[tokio::test]
async fn test_second_run_replaces_first() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.import_forecast(&weekly_forecast()).await?;
    let first = service.synthesize().await?;

    let shorter = forecast(&[("2024-07-01", 3.0, 90.0)]);
    service.import_forecast(&shorter).await?;
    let second = service.synthesize().await?;

    let written = second.written.unwrap();
    assert_eq!(written.deleted, first.batch.transactions.len() as u64);
    assert_eq!(written.inserted, 3);

    let stored = service.store().find_all("synthetic_Transactions").await?;
    assert_eq!(stored.len(), 3);
    let total: i64 = stored
        .iter()
        .map(|d| transaction_from_document(d).map(|t| t.amount))
        .sum::<Result<i64>>()?;
    assert_eq!(total, 90);

    Ok(())
}

#[tokio::test]
async fn test_forecast_collections_survive_a_run() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.import_forecast(&weekly_forecast()).await?;
    service.synthesize().await?;
    service.synthesize().await?;

    assert_eq!(service.store().count("transactions_per_day").await?, 7);
    assert_eq!(service.store().count("CTA").await?, 7);

    let stats = service.store().collection_stats().await?;
    let names: Vec<_> = stats.iter().map(|s| s.collection.as_str()).collect();
    assert_eq!(names, vec!["CTA", "synthetic_Transactions", "transactions_per_day"]);

    Ok(())
}

#[tokio::test]
async fn test_sqlite_keeps_insertion_order_across_calls() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let store = service.store();

    store
        .insert_many("ordered", &[json!({"n": 3}), json!({"n": 1})])
        .await?;
    store.insert_many("ordered", &[json!({"n": 2})]).await?;

    assert_eq!(
        store.find_all("ordered").await?,
        vec![json!({"n": 3}), json!({"n": 1}), json!({"n": 2})]
    );
    assert_eq!(store.delete_all("ordered").await?, 3);
    assert!(store.find_all("ordered").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_delete_failure_keeps_old_data() -> Result<()> {
    let store = FaultyStore::new();
    store
        .insert_many("out", &[json!({"old": 1}), json!({"old": 2})])
        .await?;
    store.fail_delete();

    let err = replace_collection(&store, "out", vec![vec![json!({"new": 1})]])
        .await
        .err()
        .expect("replacement should abort");

    assert!(matches!(err, AppError::ReplaceAborted { ref collection, .. } if collection == "out"));
    assert_eq!(
        store.find_all("out").await?,
        vec![json!({"old": 1}), json!({"old": 2})]
    );

    Ok(())
}

#[tokio::test]
async fn test_insert_failure_reports_partial_write() -> Result<()> {
    let store = FaultyStore::new();
    store.insert_many("out", &[json!({"old": 1})]).await?;

    let mut synthesizer = Synthesizer::new(DegenerateDrawPolicy::Zero, Some(11));
    let batch = synthesizer.run(&three_day_series(), 19);
    assert_eq!(batch.transactions.len(), 18);

    // first day goes through, second day fails
    store.allow_inserts(1);
    let err = replace_with_batch(&store, "out", &batch)
        .await
        .err()
        .expect("replacement should stop part way");

    match err {
        AppError::PartialReplace {
            collection,
            inserted,
            total,
            ..
        } => {
            assert_eq!(collection, "out");
            assert_eq!(inserted, 5);
            assert_eq!(total, 18);
        }
        other => panic!("unexpected error: {}", other),
    }

    let stored: Vec<SyntheticTransaction> = store
        .find_all("out")
        .await?
        .iter()
        .map(transaction_from_document)
        .collect::<Result<_>>()?;
    assert_eq!(stored.len(), 5);
    assert!(stored.iter().all(|t| t.date() == parse_date("2024-04-01")));
    assert_eq!(stored.iter().map(|t| t.amount).sum::<i64>(), 500);

    Ok(())
}

#[tokio::test]
async fn test_service_over_faulty_store_propagates_abort() -> Result<()> {
    let store = FaultyStore::new();
    let service = SynthesisService::new(store.clone(), test_config())?;
    service.import_forecast(&weekly_forecast()).await?;
    service.synthesize().await?;
    let before = store.find_all("synthetic_Transactions").await?;

    store.fail_delete();
    let err = service.synthesize().await.err().expect("run should abort");

    assert!(matches!(err, AppError::ReplaceAborted { .. }));
    assert_eq!(store.find_all("synthetic_Transactions").await?, before);

    Ok(())
}

#[tokio::test]
async fn test_stored_documents_use_output_field_names() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service
        .import_forecast(&forecast(&[("2024-05-05", 20.0, 2_000.0)]))
        .await?;
    service.synthesize().await?;

    let stored = service.store().find_all("synthetic_Transactions").await?;
    assert_eq!(stored.len(), 20);
    for document in &stored {
        assert!(document.get("Timestamp").is_some());
        assert!(document.get("Amount").is_some());
        let transaction = transaction_from_document(document)?;
        assert_eq!(transaction.date(), parse_date("2024-05-05"));
    }

    Ok(())
}
