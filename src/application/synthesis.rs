use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    Amount, COUNT_FIELD, DegenerateDrawPolicy, ForecastRecord, SynthesisError,
    SyntheticTransaction, VALUE_FIELD, assign_timestamps, decompose,
};

use super::SynthesisConfig;

/// Per-day result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub requested_count: i64,
    pub target_total: Amount,
    pub produced: usize,
    pub produced_total: Amount,
}

/// A forecast day that produced no transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct DayFailure {
    pub index: usize,
    pub date: Option<NaiveDate>,
    pub error: SynthesisError,
}

/// All transactions synthesized in one run, ordered by day and then by
/// timestamp within each day.
#[derive(Debug, Clone)]
pub struct SynthesisBatch {
    pub run_id: Uuid,
    pub seed: u64,
    pub transactions: Vec<SyntheticTransaction>,
    pub days: Vec<DaySummary>,
    pub failures: Vec<DayFailure>,
}

impl SynthesisBatch {
    /// Sum of all amounts, `None` if it does not fit in an `Amount`.
    pub fn total_amount(&self) -> Option<Amount> {
        self.transactions
            .iter()
            .try_fold(0, |total: Amount, t| total.checked_add(t.amount))
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Transactions grouped by calendar day, in batch order.
    pub fn daily_chunks(&self) -> impl Iterator<Item = &[SyntheticTransaction]> {
        self.transactions.chunk_by(|a, b| a.date() == b.date())
    }
}

/// Turns an adjusted forecast series into synthetic transactions.
pub struct Synthesizer {
    rng: StdRng,
    seed: u64,
    policy: DegenerateDrawPolicy,
    max_daily_transactions: i64,
}

impl Synthesizer {
    /// Create a synthesizer. Without a seed one is drawn from the thread RNG
    /// and recorded on the batch so the run can be replayed.
    pub fn new(policy: DegenerateDrawPolicy, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().r#gen());
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            policy,
            max_daily_transactions: i64::MAX,
        }
    }

    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self::new(config.degenerate_draw, config.seed)
            .with_max_daily_transactions(config.max_daily_transactions)
    }

    pub fn with_max_daily_transactions(mut self, limit: i64) -> Self {
        self.max_daily_transactions = limit;
        self
    }

    /// Synthesize one day, returning its transactions sorted by timestamp.
    pub fn synthesize_day(
        &mut self,
        record: &ForecastRecord,
    ) -> Result<(DaySummary, Vec<SyntheticTransaction>), SynthesisError> {
        let point = record.to_point()?;
        let count = to_whole(point.transaction_count_forecast, COUNT_FIELD)?;
        let target_total = to_whole(point.value_forecast, VALUE_FIELD)?;

        if count > self.max_daily_transactions {
            return Err(SynthesisError::InvalidInput(format!(
                "{} transactions exceeds the daily limit of {}",
                count, self.max_daily_transactions
            )));
        }

        let amounts = decompose(target_total, count, self.policy, &mut self.rng)?;
        let mut transactions = assign_timestamps(point.date, &amounts, &mut self.rng);
        transactions.sort_by_key(|t| t.timestamp);

        let summary = DaySummary {
            date: point.date,
            requested_count: count,
            target_total,
            produced: transactions.len(),
            produced_total: transactions.iter().map(|t| t.amount).sum(),
        };
        Ok((summary, transactions))
    }

    /// Synthesize the first `horizon` days of `series`. A failing day is
    /// recorded and skipped; the others are unaffected.
    pub fn run(&mut self, series: &[ForecastRecord], horizon: usize) -> SynthesisBatch {
        let run_id = Uuid::new_v4();
        info!(%run_id, seed = self.seed, days = series.len().min(horizon), "starting synthesis");
        if series.len() > horizon {
            debug!(
                ignored = series.len() - horizon,
                "forecast extends past the horizon"
            );
        }

        let mut transactions = Vec::new();
        let mut days = Vec::new();
        let mut failures = Vec::new();

        for (index, record) in series.iter().take(horizon).enumerate() {
            match self.synthesize_day(record) {
                Ok((summary, day)) => {
                    debug!(
                        date = %summary.date,
                        count = summary.produced,
                        total = summary.produced_total,
                        "synthesized day"
                    );
                    transactions.extend(day);
                    days.push(summary);
                }
                Err(error) => {
                    warn!(index, date = ?record.date, %error, "skipping forecast day");
                    failures.push(DayFailure {
                        index,
                        date: record.date,
                        error,
                    });
                }
            }
        }

        info!(
            %run_id,
            transactions = transactions.len(),
            days = days.len(),
            failed = failures.len(),
            "synthesis finished"
        );

        SynthesisBatch {
            run_id,
            seed: self.seed,
            transactions,
            days,
            failures,
        }
    }
}

/// Round a forecast metric to the nearest whole number.
fn to_whole(value: f64, field: &str) -> Result<i64, SynthesisError> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let rounded = value.round();
    if !rounded.is_finite() || rounded >= LIMIT || rounded < -LIMIT {
        return Err(SynthesisError::InvalidInput(format!(
            "{} of {} cannot be used as a whole number",
            field, value
        )));
    }
    Ok(rounded as i64)
}
