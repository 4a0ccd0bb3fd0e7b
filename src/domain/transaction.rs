use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Amounts are whole units of the forecast value metric.
pub type Amount = i64;

/// One synthesized transaction. Serialized with the field names the
/// destination collection uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticTransaction {
    #[serde(rename = "Timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Amount")]
    pub amount: Amount,
}

impl SyntheticTransaction {
    pub fn new(timestamp: NaiveDateTime, amount: Amount) -> Self {
        Self { timestamp, amount }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Give every amount a uniformly random time of day on `date`.
///
/// Output keeps the order of `amounts` (record `i` carries `amounts[i]`);
/// callers that need chronological order sort afterwards. Two records may
/// share a timestamp.
pub fn assign_timestamps<R: Rng>(
    date: NaiveDate,
    amounts: &[Amount],
    rng: &mut R,
) -> Vec<SyntheticTransaction> {
    let midnight = date.and_time(NaiveTime::default());

    amounts
        .iter()
        .map(|&amount| {
            let hour: i64 = rng.gen_range(0..=23);
            let minute: i64 = rng.gen_range(0..=59);
            let second: i64 = rng.gen_range(0..=59);
            let offset = Duration::seconds(hour * 3600 + minute * 60 + second);
            SyntheticTransaction::new(midnight + offset, amount)
        })
        .collect()
}
