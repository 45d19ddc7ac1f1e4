//! Common test utilities for the nudge test suite.
//!
//! Fixtures for building challenge days, step histories and monotone
//! transition tensors shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use ndarray::{Array4, s};
use nudge::{
    activity::StepRecord,
    challenge::{Challenge, ChallengeLayout},
    position::PositionAxis,
    position_prior::PositionKernel,
    timestep::Discretizer,
};

pub const USER: &str = "alice";

/// Parse an RFC 3339 timestamp.
pub fn at(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Challenges of `layout` for `n_days` days starting at `start`.
pub fn challenge_days(
    layout: &ChallengeLayout,
    discretizer: &Discretizer,
    start: NaiveDate,
    n_days: usize,
) -> Vec<Challenge> {
    (0..n_days)
        .flat_map(|d| {
            layout
                .challenges_on(start + Duration::days(d as i64), discretizer)
                .unwrap()
        })
        .collect()
}

/// Hourly cumulative step records growing linearly to `daily_steps`.
pub fn linear_history(
    discretizer: &Discretizer,
    start: NaiveDate,
    n_days: usize,
    daily_steps: u32,
) -> Vec<StepRecord> {
    let mut records = Vec::new();
    for d in 0..n_days {
        let midnight = discretizer.start_of_day(start + Duration::days(d as i64));
        for hour in 1..=24u32 {
            records.push(StepRecord::new(
                midnight + Duration::hours(i64::from(hour)) - Duration::seconds(1),
                daily_steps * hour / 24,
            ));
        }
    }
    records
}

/// The same monotone kernel for every action and timestep.
pub fn monotone_transition(
    axis: &PositionAxis,
    n_action: usize,
    n_timestep: usize,
    drift: f64,
    sigma: f64,
) -> Array4<f64> {
    let kernel = PositionKernel::gaussian(axis, drift, sigma).unwrap().monotone();
    let n = axis.len();
    let mut transition = Array4::zeros((n_action, n_timestep, n, n));
    for a in 0..n_action {
        for t in 0..n_timestep {
            transition.slice_mut(s![a, t, .., ..]).assign(kernel.matrix());
        }
    }
    transition
}
