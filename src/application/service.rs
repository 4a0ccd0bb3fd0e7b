use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::domain::{
    AdjustmentIssue, Amount, ForecastPoint, ForecastRecord, SyntheticTransaction, adjust,
};
use crate::storage::{
    DocumentStore, SqliteStore, forecast_document, merge_forecast_documents,
    transaction_from_document,
};

use super::{
    AppError, ReplaceOutcome, SynthesisBatch, SynthesisConfig, Synthesizer, replace_collection,
    replace_with_batch,
};

/// Application service for the synthesis pipeline.
/// This is the primary interface for any client (CLI, tests, jobs).
pub struct SynthesisService<S = SqliteStore> {
    store: S,
    config: SynthesisConfig,
}

/// Result of a synthesis run
pub struct RunReport {
    pub batch: SynthesisBatch,
    /// Forecast days considered (after applying the horizon)
    pub forecast_days: usize,
    pub adjustment_issues: Vec<AdjustmentIssue>,
    /// `None` when the batch was not persisted
    pub written: Option<ReplaceOutcome>,
}

/// Result of writing a forecast into the two metric collections
pub struct ForecastImportOutcome {
    pub counts: ReplaceOutcome,
    pub values: ReplaceOutcome,
}

/// Filter for reading stored transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub date: Option<NaiveDate>,
    pub limit: Option<usize>,
}

/// Stored transactions aggregated per day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub count: usize,
    pub total: Amount,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
}

impl SynthesisService<SqliteStore> {
    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, config: SynthesisConfig) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = SqliteStore::init(&db_url).await?;
        Self::new(store, config)
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, config: SynthesisConfig) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = SqliteStore::connect(&db_url).await?;
        Self::new(store, config)
    }
}

impl<S: DocumentStore> SynthesisService<S> {
    pub fn new(store: S, config: SynthesisConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================
    // Forecast input
    // ========================

    /// Read both forecast collections and merge them row by row.
    pub async fn load_forecast(&self) -> Result<Vec<ForecastRecord>, AppError> {
        let counts = self.store.find_all(&self.config.count_collection).await?;
        let values = self.store.find_all(&self.config.value_collection).await?;

        Ok(merge_forecast_documents(
            &counts,
            &values,
            &self.config.count_field(),
            &self.config.value_field(),
        ))
    }

    /// Replace both forecast collections with `points`.
    /// The two collections are written one after the other, not atomically.
    pub async fn import_forecast(
        &self,
        points: &[ForecastPoint],
    ) -> Result<ForecastImportOutcome, AppError> {
        let count_field = self.config.count_field();
        let value_field = self.config.value_field();

        let count_docs = points
            .iter()
            .map(|p| forecast_document(p.date, &count_field, p.transaction_count_forecast))
            .collect();
        let value_docs = points
            .iter()
            .map(|p| forecast_document(p.date, &value_field, p.value_forecast))
            .collect();

        let counts =
            replace_collection(&self.store, &self.config.count_collection, vec![count_docs])
                .await?;
        let values =
            replace_collection(&self.store, &self.config.value_collection, vec![value_docs])
                .await?;

        Ok(ForecastImportOutcome { counts, values })
    }

    // ========================
    // Synthesis
    // ========================

    /// Run the pipeline without touching the output collection.
    pub async fn preview(&self) -> Result<RunReport, AppError> {
        let mut forecast = self.load_forecast().await?;
        if forecast.is_empty() {
            return Err(AppError::EmptyForecast {
                count_collection: self.config.count_collection.clone(),
                value_collection: self.config.value_collection.clone(),
            });
        }
        forecast.truncate(self.config.horizon_days);
        let forecast_days = forecast.len();

        let adjusted = adjust(forecast, &self.config.adjustment);
        for issue in &adjusted.issues {
            warn!(
                index = issue.index,
                date = ?issue.date,
                error = %issue.error,
                "forecast day left unadjusted"
            );
        }

        let mut synthesizer = Synthesizer::from_config(&self.config);
        let batch = synthesizer.run(&adjusted.records, self.config.horizon_days);

        Ok(RunReport {
            batch,
            forecast_days,
            adjustment_issues: adjusted.issues,
            written: None,
        })
    }

    /// Run the pipeline and replace the output collection with the result.
    pub async fn synthesize(&self) -> Result<RunReport, AppError> {
        let mut report = self.preview().await?;
        if report.batch.is_empty() {
            warn!(
                collection = %self.config.output_collection,
                "no transactions synthesized, output collection will be emptied"
            );
        }

        let written = replace_with_batch(
            &self.store,
            &self.config.output_collection,
            &report.batch,
        )
        .await?;

        info!(
            run_id = %report.batch.run_id,
            deleted = written.deleted,
            inserted = written.inserted,
            "synthetic transactions stored"
        );
        report.written = Some(written);
        Ok(report)
    }

    // ========================
    // Output
    // ========================

    /// Read stored synthetic transactions in stored order.
    pub async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<SyntheticTransaction>, AppError> {
        let documents = self
            .store
            .find_all(&self.config.output_collection)
            .await?;

        let mut transactions = Vec::new();
        for document in &documents {
            if filter.limit.is_some_and(|l| transactions.len() >= l) {
                break;
            }
            let transaction = transaction_from_document(document)?;
            if filter.date.is_some_and(|d| transaction.date() != d) {
                continue;
            }
            transactions.push(transaction);
        }

        Ok(transactions)
    }

    /// Aggregate stored transactions per calendar day.
    pub async fn daily_totals(&self) -> Result<Vec<DailyTotal>, AppError> {
        let mut transactions = self
            .list_transactions(&TransactionFilter::default())
            .await?;
        transactions.sort_by_key(|t| t.timestamp);

        Ok(transactions
            .chunk_by(|a, b| a.date() == b.date())
            .map(|day| DailyTotal {
                date: day[0].date(),
                count: day.len(),
                total: day.iter().map(|t| t.amount).sum(),
                first: day[0].timestamp,
                last: day[day.len() - 1].timestamp,
            })
            .collect())
    }
}
