//! Step history and challenge records turned into observation streams.
//!
//! For every observed day the cumulative step count is sampled at the
//! `n_timestep + 1` bin boundaries and mapped to the nearest position level;
//! the actions come from the challenges scheduled that day. Together they are
//! the `(actions, positions)` pairs consumed by
//! [`PseudoCounts::absorb`](crate::pseudo_counts::PseudoCounts::absorb).

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    challenge::Challenge,
    position::PositionAxis,
    timestep::{Discretizer, SECONDS_IN_A_DAY},
};

/// Cumulative steps since local midnight reported at `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub steps: u32,
}

impl StepRecord {
    pub fn new(timestamp: DateTime<FixedOffset>, steps: u32) -> Self {
        Self { timestamp, steps }
    }
}

/// Per-day action vectors and position boundaries.
///
/// `actions[d]` always has `n_timestep` entries; `positions[d]` has
/// `n_timestep + 1` entries for complete days and fewer for the current one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyObservations {
    pub dates: Vec<NaiveDate>,
    pub actions: Vec<Vec<usize>>,
    pub positions: Vec<Vec<usize>>,
}

impl DailyObservations {
    pub fn n_days(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of transitions the streams contain.
    pub fn n_transitions(&self) -> usize {
        self.positions
            .iter()
            .map(|day| day.len().saturating_sub(1))
            .sum()
    }
}

/// Builds observation streams in a fixed day partition and position axis.
#[derive(Debug, Clone)]
pub struct HistoryExtractor {
    discretizer: Discretizer,
    axis: PositionAxis,
}

impl HistoryExtractor {
    pub fn new(discretizer: Discretizer, axis: PositionAxis) -> Self {
        Self { discretizer, axis }
    }

    pub fn discretizer(&self) -> &Discretizer {
        &self.discretizer
    }

    pub fn axis(&self) -> &PositionAxis {
        &self.axis
    }

    /// Records grouped by local date, each day sorted by timestamp.
    pub fn group_by_day(&self, records: &[StepRecord]) -> BTreeMap<NaiveDate, Vec<StepRecord>> {
        let mut days: BTreeMap<NaiveDate, Vec<StepRecord>> = BTreeMap::new();
        for record in records {
            days.entry(self.discretizer.local_date(&record.timestamp))
                .or_default()
                .push(*record);
        }
        for day in days.values_mut() {
            day.sort_by_key(|r| r.timestamp);
        }
        days
    }

    /// Instant of boundary `k` (`0..=n_timestep`) on `date`.
    pub fn boundary(&self, date: NaiveDate, k: usize) -> DateTime<FixedOffset> {
        let n = self.discretizer.n_timestep() as u64;
        let offset = (k as u64 * SECONDS_IN_A_DAY).div_ceil(n);
        self.discretizer.start_of_day(date) + Duration::seconds(offset as i64)
    }

    /// Cumulative steps at the first `n_boundaries` boundaries of `date`.
    ///
    /// The value at a boundary is the largest count reported at or before it,
    /// zero when nothing was reported yet, so the sequence never decreases.
    pub fn cumulative_steps(
        &self,
        day_records: &[StepRecord],
        date: NaiveDate,
        n_boundaries: usize,
    ) -> Vec<f64> {
        let mut cumulative = Vec::with_capacity(n_boundaries);
        let mut idx = 0;
        let mut running = 0u32;
        for k in 0..n_boundaries {
            let boundary = self.boundary(date, k);
            while idx < day_records.len() && day_records[idx].timestamp <= boundary {
                running = running.max(day_records[idx].steps);
                idx += 1;
            }
            cumulative.push(f64::from(running));
        }
        cumulative
    }

    /// Nearest position level for every cumulative count.
    pub fn positions(&self, cumulative: &[f64]) -> Vec<usize> {
        cumulative
            .iter()
            .map(|&steps| self.axis.nearest_index(steps))
            .collect()
    }

    /// Action vector of `date`: 1 for each timestep `[t(begin), t(begin) + duration)`
    /// of every challenge starting that day.
    pub fn actions_on(&self, challenges: &[Challenge], date: NaiveDate) -> Result<Vec<usize>> {
        let n_timestep = self.discretizer.n_timestep();
        let mut actions = vec![0; n_timestep];
        for challenge in challenges {
            if self.discretizer.local_date(&challenge.begin) != date {
                continue;
            }
            let start = self.discretizer.timestep_of(&challenge.begin);
            let duration = self.discretizer.duration_to_n_timesteps(challenge.duration())?;
            let stop = (start + duration).min(n_timestep);
            actions[start..stop].fill(1);
        }
        Ok(actions)
    }

    /// Position index of the latest record on `now`'s local date, or the
    /// origin when nothing was reported yet today.
    pub fn current_position(&self, records: &[StepRecord], now: &DateTime<FixedOffset>) -> usize {
        let today = self.discretizer.local_date(now);
        records
            .iter()
            .filter(|r| r.timestamp <= *now && self.discretizer.local_date(&r.timestamp) == today)
            .max_by_key(|r| (r.timestamp, r.steps))
            .map(|r| self.axis.nearest_index(f64::from(r.steps)))
            .unwrap_or_else(|| self.axis.origin_index())
    }

    /// Observation streams for every day with step records up to `now`.
    ///
    /// Days before today contribute all `n_timestep` transitions; today
    /// contributes the transitions of the bins that have fully elapsed.
    pub fn observations(
        &self,
        records: &[StepRecord],
        challenges: &[Challenge],
        now: &DateTime<FixedOffset>,
    ) -> Result<DailyObservations> {
        let today = self.discretizer.local_date(now);
        let now_t = self.discretizer.timestep_of(now);
        let n_timestep = self.discretizer.n_timestep();

        let past: Vec<StepRecord> = records
            .iter()
            .filter(|r| r.timestamp <= *now)
            .copied()
            .collect();

        let mut observations = DailyObservations::default();
        for (date, day_records) in self.group_by_day(&past) {
            let n_boundaries = if date < today {
                n_timestep + 1
            } else if date == today {
                now_t + 1
            } else {
                continue;
            };
            let cumulative = self.cumulative_steps(&day_records, date, n_boundaries);
            observations.dates.push(date);
            observations.actions.push(self.actions_on(challenges, date)?);
            observations.positions.push(self.positions(&cumulative));
        }
        Ok(observations)
    }
}
