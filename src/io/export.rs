use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{SynthesisService, TransactionFilter};
use crate::domain::SyntheticTransaction;
use crate::storage::DocumentStore;

/// Snapshot of the synthetic transaction collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub collection: String,
    pub transactions: Vec<SyntheticTransaction>,
}

/// Exporter for writing stored synthetic transactions to files
pub struct Exporter<'a, S> {
    service: &'a SynthesisService<S>,
}

impl<'a, S: DocumentStore> Exporter<'a, S> {
    pub fn new(service: &'a SynthesisService<S>) -> Self {
        Self { service }
    }

    /// Export transactions to CSV format
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self
            .service
            .list_transactions(&TransactionFilter::default())
            .await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["Timestamp", "Amount"])?;

        for transaction in &transactions {
            csv_writer.write_record(&[
                transaction.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                transaction.amount.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }

    /// Export per-day totals to CSV format
    pub async fn export_daily_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let totals = self.service.daily_totals().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["date", "count", "total"])?;

        for day in &totals {
            csv_writer.write_record(&[
                day.date.to_string(),
                day.count.to_string(),
                day.total.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(totals.len())
    }

    /// Export transactions as a JSON snapshot
    pub async fn export_transactions_json<W: Write>(
        &self,
        mut writer: W,
    ) -> Result<TransactionSnapshot> {
        let transactions = self
            .service
            .list_transactions(&TransactionFilter::default())
            .await?;

        let snapshot = TransactionSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            collection: self.service.config().output_collection.clone(),
            transactions,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
