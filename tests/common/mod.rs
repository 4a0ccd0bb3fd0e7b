// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use tempfile::TempDir;
use txsynth::application::{SynthesisConfig, SynthesisService};
use txsynth::domain::{ForecastAdjustment, ForecastPoint};

/// Config with a fixed seed and no adjustment, so tests can predict totals.
pub fn test_config() -> SynthesisConfig {
    SynthesisConfig {
        adjustment: ForecastAdjustment::identity(),
        seed: Some(42),
        ..Default::default()
    }
}

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(SynthesisService, TempDir)> {
    test_service_with(test_config()).await
}

pub async fn test_service_with(config: SynthesisConfig) -> Result<(SynthesisService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = SynthesisService::init(db_path.to_str().unwrap(), config).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Build forecast points from (date, count, value) triples
pub fn forecast(days: &[(&str, f64, f64)]) -> Vec<ForecastPoint> {
    days.iter()
        .map(|&(date, count, value)| ForecastPoint {
            date: parse_date(date),
            transaction_count_forecast: count,
            value_forecast: value,
        })
        .collect()
}

/// A week of plausible daily forecasts starting 2024-06-01
pub fn weekly_forecast() -> Vec<ForecastPoint> {
    forecast(&[
        ("2024-06-01", 12.0, 4_800.0),
        ("2024-06-02", 9.0, 3_150.0),
        ("2024-06-03", 15.0, 6_000.0),
        ("2024-06-04", 14.0, 5_320.0),
        ("2024-06-05", 11.0, 4_400.0),
        ("2024-06-06", 16.0, 7_040.0),
        ("2024-06-07", 10.0, 3_900.0),
    ])
}
