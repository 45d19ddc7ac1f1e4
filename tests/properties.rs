//! Property tests for discretisation and normalisation.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use ndarray::{Array4, Axis};
use nudge::{pseudo_counts::normalize_last_axis, timestep::Discretizer};
use proptest::prelude::*;

fn divisors_of_a_day() -> impl Strategy<Value = usize> {
    prop::sample::select(vec![1usize, 2, 3, 4, 6, 8, 12, 24, 48, 96, 144, 288])
}

proptest! {
    #[test]
    fn timestep_round_trips(
        n_timestep in divisors_of_a_day(),
        offset_hours in -12i32..=14,
        day in 0i64..3650,
        t_frac in 0.0f64..1.0,
    ) {
        let discretizer = Discretizer::with_utc_offset(n_timestep, offset_hours * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Duration::days(day);
        let t = ((t_frac * n_timestep as f64) as usize).min(n_timestep - 1);
        let start = discretizer.datetime_on(t, date).unwrap();
        prop_assert_eq!(discretizer.timestep_of(&start), t);
        prop_assert_eq!(discretizer.local_date(&start), date);
    }

    #[test]
    fn any_instant_maps_inside_the_day(
        n_timestep in divisors_of_a_day(),
        secs in 0i64..400_000_000,
    ) {
        let discretizer = Discretizer::with_utc_offset(n_timestep, 3600).unwrap();
        let utc: DateTime<FixedOffset> = FixedOffset::east_opt(0)
            .unwrap()
            .timestamp_opt(1_600_000_000 + secs, 0)
            .unwrap();
        prop_assert!(discretizer.timestep_of(&utc) < n_timestep);
    }

    #[test]
    fn normalised_rows_sum_to_one(
        values in prop::collection::vec(0.01f64..100.0, 2 * 3 * 4 * 4),
    ) {
        let alpha = Array4::from_shape_vec((2, 3, 4, 4), values).unwrap();
        let normalized = normalize_last_axis(&alpha);
        for row in normalized.lanes(Axis(3)) {
            prop_assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }
}
