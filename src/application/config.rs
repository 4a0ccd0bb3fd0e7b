use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{DegenerateDrawPolicy, ForecastAdjustment};

use super::AppError;

/// Settings for one synthesis run. Built once and handed to the service;
/// nothing reads process state after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Collection holding the per-day transaction count forecast
    pub count_collection: String,
    /// Collection holding the per-day total value forecast
    pub value_collection: String,
    /// Collection that receives the synthetic transactions
    pub output_collection: String,
    /// Number of forecast days to synthesize
    pub horizon_days: usize,
    pub adjustment: ForecastAdjustment,
    /// Fixed RNG seed for reproducible runs (random when absent)
    pub seed: Option<u64>,
    pub degenerate_draw: DegenerateDrawPolicy,
    /// Days forecasting more transactions than this are rejected
    pub max_daily_transactions: i64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            count_collection: "transactions_per_day".into(),
            value_collection: "CTA".into(),
            output_collection: "synthetic_Transactions".into(),
            horizon_days: 19,
            adjustment: ForecastAdjustment::new(5.0, 5.0, 5.0, 5.0),
            seed: None,
            degenerate_draw: DegenerateDrawPolicy::Fail,
            max_daily_transactions: 1_000_000,
        }
    }
}

impl SynthesisConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let data = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| AppError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for (key, name) in [
            ("count_collection", &self.count_collection),
            ("value_collection", &self.value_collection),
            ("output_collection", &self.output_collection),
        ] {
            if name.trim().is_empty() {
                return Err(AppError::Config(format!("{} must not be empty", key)));
            }
        }

        if self.output_collection == self.count_collection
            || self.output_collection == self.value_collection
        {
            return Err(AppError::Config(format!(
                "output collection '{}' would overwrite a forecast collection",
                self.output_collection
            )));
        }

        if self.count_collection == self.value_collection {
            return Err(AppError::Config(
                "count and value forecasts must live in different collections".into(),
            ));
        }

        if self.horizon_days == 0 {
            return Err(AppError::Config("horizon_days must be at least 1".into()));
        }

        if self.max_daily_transactions < 1 {
            return Err(AppError::Config(
                "max_daily_transactions must be at least 1".into(),
            ));
        }

        let knobs = [
            self.adjustment.add_count,
            self.adjustment.mul_count,
            self.adjustment.add_value,
            self.adjustment.mul_value,
        ];
        if knobs.iter().any(|k| !k.is_finite()) {
            return Err(AppError::Config("adjustment factors must be finite".into()));
        }

        Ok(())
    }

    /// Metric field name inside count forecast documents.
    pub fn count_field(&self) -> String {
        format!("{}_forecast", self.count_collection)
    }

    /// Metric field name inside value forecast documents.
    pub fn value_field(&self) -> String {
        format!("{}_forecast", self.value_collection)
    }
}
