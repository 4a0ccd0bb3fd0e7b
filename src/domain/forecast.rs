use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SynthesisError;

pub const COUNT_FIELD: &str = "transaction_count_forecast";
pub const VALUE_FIELD: &str = "value_forecast";
pub const DATE_FIELD: &str = "timestamp";

/// A forecast day as it was read from storage. Any field may be absent when
/// the two metric collections do not line up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub date: Option<NaiveDate>,
    pub transaction_count_forecast: Option<f64>,
    pub value_forecast: Option<f64>,
}

/// A complete forecast day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub transaction_count_forecast: f64,
    pub value_forecast: f64,
}

impl ForecastRecord {
    pub fn new(date: NaiveDate, transaction_count_forecast: f64, value_forecast: f64) -> Self {
        Self {
            date: Some(date),
            transaction_count_forecast: Some(transaction_count_forecast),
            value_forecast: Some(value_forecast),
        }
    }

    /// Convert into a complete point, naming the first missing field.
    pub fn to_point(&self) -> Result<ForecastPoint, SynthesisError> {
        Ok(ForecastPoint {
            date: self.date.ok_or_else(|| SynthesisError::missing(DATE_FIELD))?,
            transaction_count_forecast: self
                .transaction_count_forecast
                .ok_or_else(|| SynthesisError::missing(COUNT_FIELD))?,
            value_forecast: self
                .value_forecast
                .ok_or_else(|| SynthesisError::missing(VALUE_FIELD))?,
        })
    }
}

/// Affine knobs applied as `(x + add) * mul`, independently per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastAdjustment {
    pub add_count: f64,
    pub mul_count: f64,
    pub add_value: f64,
    pub mul_value: f64,
}

impl Default for ForecastAdjustment {
    fn default() -> Self {
        Self::identity()
    }
}

impl ForecastAdjustment {
    pub fn identity() -> Self {
        Self {
            add_count: 0.0,
            mul_count: 1.0,
            add_value: 0.0,
            mul_value: 1.0,
        }
    }

    pub fn new(add_count: f64, mul_count: f64, add_value: f64, mul_value: f64) -> Self {
        Self {
            add_count,
            mul_count,
            add_value,
            mul_value,
        }
    }

    fn apply_count(&self, count: f64) -> f64 {
        (count + self.add_count) * self.mul_count
    }

    fn apply_value(&self, value: f64) -> f64 {
        (value + self.add_value) * self.mul_value
    }

    /// Transform both metrics of one record. The record is left untouched on error.
    pub fn apply(&self, record: &mut ForecastRecord) -> Result<(), SynthesisError> {
        let count = record
            .transaction_count_forecast
            .ok_or_else(|| SynthesisError::missing(COUNT_FIELD))?;
        let value = record
            .value_forecast
            .ok_or_else(|| SynthesisError::missing(VALUE_FIELD))?;

        let new_count = self.apply_count(count);
        let new_value = self.apply_value(value);
        if !new_count.is_finite() || !new_value.is_finite() {
            return Err(SynthesisError::InvalidInput(format!(
                "adjusted forecast is not finite (count {}, value {})",
                new_count, new_value
            )));
        }

        record.transaction_count_forecast = Some(new_count);
        record.value_forecast = Some(new_value);
        Ok(())
    }
}

/// A record the adjuster could not transform, by position in the series.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentIssue {
    pub index: usize,
    pub date: Option<NaiveDate>,
    pub error: SynthesisError,
}

/// Output of an adjustment pass. `records` has the same length and order as
/// the input; entries listed in `issues` are carried through unadjusted.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedSeries {
    pub records: Vec<ForecastRecord>,
    pub issues: Vec<AdjustmentIssue>,
}

impl AdjustedSeries {
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Apply `adjustment` to every record. A failing record never stops the pass.
pub fn adjust(series: Vec<ForecastRecord>, adjustment: &ForecastAdjustment) -> AdjustedSeries {
    let mut records = series;
    let mut issues = Vec::new();

    for (index, record) in records.iter_mut().enumerate() {
        if let Err(error) = adjustment.apply(record) {
            issues.push(AdjustmentIssue {
                index,
                date: record.date,
                error,
            });
        }
    }

    AdjustedSeries { records, issues }
}
