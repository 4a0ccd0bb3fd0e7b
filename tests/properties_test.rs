//! Property-based tests for the synthesis pipeline.
//!
//! - Decomposition keeps the requested count and the exact total
//! - Adjustment with the identity knobs is a no-op
//! - Timestamp assignment is a bijection onto the given day

use chrono::NaiveDate;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use txsynth::application::Synthesizer;
use txsynth::domain::{
    DegenerateDrawPolicy, ForecastAdjustment, ForecastRecord, adjust, assign_timestamps, decompose,
};

/// Strategy for a calendar day between 2000 and 2099.
fn any_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("valid day"))
}

/// Strategy for forecast metrics that survive the adjuster unchanged.
fn metric() -> impl Strategy<Value = f64> {
    (0u32..1_000_000).prop_map(|v| v as f64 / 4.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any non-negative total splits into exactly `count` non-negative pieces
    /// that add back up to the total.
    #[test]
    fn prop_decompose_preserves_count_and_total(
        target in 0i64..10_000_000,
        count in 1i64..500,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let pieces = decompose(target, count, DegenerateDrawPolicy::Zero, &mut rng)
            .expect("zero policy never fails on valid input");

        prop_assert_eq!(pieces.len() as i64, count);
        prop_assert_eq!(pieces.iter().sum::<i64>(), target);
        prop_assert!(pieces.iter().all(|&p| p >= 0));
    }

    /// With the fail policy a run either errors or still honours the total.
    #[test]
    fn prop_fail_policy_never_returns_a_wrong_split(
        target in 0i64..1_000,
        count in 1i64..200,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        if let Ok(pieces) = decompose(target, count, DegenerateDrawPolicy::Fail, &mut rng) {
            prop_assert_eq!(pieces.len() as i64, count);
            prop_assert_eq!(pieces.iter().sum::<i64>(), target);
            prop_assert!(pieces.iter().all(|&p| p >= 0));
        }
    }

    /// Two pieces are always a quarter and the rest.
    #[test]
    fn prop_two_pieces_split_by_quarter(target in 0i64..1_000_000_000, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let pieces = decompose(target, 2, DegenerateDrawPolicy::Zero, &mut rng)
            .expect("two pieces always split");

        prop_assert_eq!(pieces, vec![target / 4, target - target / 4]);
    }

    #[test]
    fn prop_identity_adjustment_is_noop(
        rows in prop::collection::vec((any_date(), metric(), metric()), 0..30),
    ) {
        let series: Vec<ForecastRecord> = rows
            .iter()
            .map(|&(date, count, value)| ForecastRecord::new(date, count, value))
            .collect();

        let adjusted = adjust(series.clone(), &ForecastAdjustment::identity());

        prop_assert!(adjusted.is_complete());
        prop_assert_eq!(adjusted.records, series);
    }

    #[test]
    fn prop_timestamps_stay_on_day_and_keep_amounts(
        date in any_date(),
        amounts in prop::collection::vec(0i64..100_000, 0..200),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let transactions = assign_timestamps(date, &amounts, &mut rng);

        prop_assert_eq!(transactions.len(), amounts.len());
        prop_assert!(transactions.iter().all(|t| t.date() == date));
        let carried: Vec<i64> = transactions.iter().map(|t| t.amount).collect();
        prop_assert_eq!(carried, amounts);
    }

    /// A synthesized day matches its forecast and comes out in time order.
    #[test]
    fn prop_synthesized_day_matches_forecast(
        date in any_date(),
        count in 1u32..300,
        value in 0u32..5_000_000,
        seed in any::<u64>(),
    ) {
        let mut synthesizer = Synthesizer::new(DegenerateDrawPolicy::Zero, Some(seed));
        let record = ForecastRecord::new(date, count as f64, value as f64);

        let (summary, day) = synthesizer.synthesize_day(&record).expect("valid day");

        prop_assert_eq!(day.len(), count as usize);
        prop_assert_eq!(summary.produced_total, value as i64);
        prop_assert!(day.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
