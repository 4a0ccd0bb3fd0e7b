use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::domain::{DATE_FIELD, ForecastRecord, SyntheticTransaction};

use super::Document;

/// Parse a forecast timestamp. Accepts a bare date, a naive date-time
/// (with or without fractional seconds) and RFC 3339.
pub fn parse_forecast_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Build one forecast metric document: `{timestamp, <field>: value}`.
pub fn forecast_document(date: NaiveDate, field: &str, value: f64) -> Document {
    let mut body = Map::new();
    body.insert(
        DATE_FIELD.to_string(),
        json!(date.format("%Y-%m-%dT00:00:00").to_string()),
    );
    body.insert(field.to_string(), json!(value));
    Value::Object(body)
}

fn read_date(document: &Document, position: usize) -> Option<NaiveDate> {
    let raw = document.get(DATE_FIELD)?;
    let parsed = raw.as_str().and_then(parse_forecast_date);
    if parsed.is_none() {
        warn!(position, value = %raw, "unreadable forecast timestamp");
    }
    parsed
}

fn read_metric(document: &Document, field: &str, position: usize) -> Option<f64> {
    match document.get(field) {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let parsed = raw.as_f64();
            if parsed.is_none() {
                warn!(position, field, value = %raw, "non-numeric forecast value");
            }
            parsed
        }
    }
}

/// Merge the count and value collections row by row.
///
/// The date comes from the count row when it has one. When one collection
/// is longer than the other, the extra rows lack the other metric.
pub fn merge_forecast_documents(
    counts: &[Document],
    values: &[Document],
    count_field: &str,
    value_field: &str,
) -> Vec<ForecastRecord> {
    let rows = counts.len().max(values.len());

    (0..rows)
        .map(|position| {
            let count_doc = counts.get(position);
            let value_doc = values.get(position);

            ForecastRecord {
                date: count_doc
                    .and_then(|doc| read_date(doc, position))
                    .or_else(|| value_doc.and_then(|doc| read_date(doc, position))),
                transaction_count_forecast: count_doc
                    .and_then(|doc| read_metric(doc, count_field, position)),
                value_forecast: value_doc.and_then(|doc| read_metric(doc, value_field, position)),
            }
        })
        .collect()
}

pub fn transaction_document(transaction: &SyntheticTransaction) -> Result<Document> {
    serde_json::to_value(transaction).context("Failed to encode transaction")
}

pub fn transaction_from_document(document: &Document) -> Result<SyntheticTransaction> {
    serde_json::from_value(document.clone()).context("Invalid transaction document")
}
