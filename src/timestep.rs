//! Discretisation of the calendar day into evenly sized timesteps.
//!
//! Bin `t` covers `[t·Δ, (t+1)·Δ)` of the local day with `Δ = 86400 s / n`.
//! All conversions happen in the configured timezone, so two instants with the
//! same local wall-clock time always land in the same bin.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike};

use crate::{Error, Result};

pub const SECONDS_IN_A_DAY: u64 = 86_400;

/// Maps datetimes to timestep indices of a fixed day partition and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discretizer {
    n_timestep: usize,
    timezone: FixedOffset,
}

impl Discretizer {
    /// Create a discretizer with `n_timestep` bins per day in the given timezone.
    pub fn new(n_timestep: usize, timezone: FixedOffset) -> Result<Self> {
        if n_timestep == 0 || n_timestep as u64 > SECONDS_IN_A_DAY {
            return Err(Error::config(format!(
                "n_timestep must lie in [1, {SECONDS_IN_A_DAY}], got {n_timestep}"
            )));
        }
        Ok(Self {
            n_timestep,
            timezone,
        })
    }

    /// Discretizer with the timezone given as seconds east of UTC.
    pub fn with_utc_offset(n_timestep: usize, utc_offset_seconds: i32) -> Result<Self> {
        let timezone = FixedOffset::east_opt(utc_offset_seconds).ok_or_else(|| {
            Error::config(format!("invalid UTC offset of {utc_offset_seconds} seconds"))
        })?;
        Self::new(n_timestep, timezone)
    }

    pub fn n_timestep(&self) -> usize {
        self.n_timestep
    }

    pub fn timezone(&self) -> FixedOffset {
        self.timezone
    }

    /// Express any timezone-aware datetime in the configured timezone.
    pub fn local<Tz: TimeZone>(&self, dt: &DateTime<Tz>) -> DateTime<FixedOffset> {
        dt.with_timezone(&self.timezone)
    }

    /// Local calendar date of `dt`.
    pub fn local_date<Tz: TimeZone>(&self, dt: &DateTime<Tz>) -> NaiveDate {
        self.local(dt).date_naive()
    }

    /// Timestep index of `dt`, always in `[0, n_timestep)`.
    pub fn timestep_of<Tz: TimeZone>(&self, dt: &DateTime<Tz>) -> usize {
        let seconds = u64::from(self.local(dt).num_seconds_from_midnight());
        let t = (seconds * self.n_timestep as u64 / SECONDS_IN_A_DAY) as usize;
        t.min(self.n_timestep - 1)
    }

    /// Local midnight starting the calendar day `date`.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        let naive = date.and_time(NaiveTime::MIN);
        // Fixed offsets have no gaps or folds.
        self.timezone
            .from_local_datetime(&naive)
            .single()
            .unwrap_or_else(|| self.timezone.from_utc_datetime(&naive))
    }

    /// Start of bin `t` on the local calendar date of `now`.
    pub fn datetime_of<Tz: TimeZone>(
        &self,
        t: usize,
        now: &DateTime<Tz>,
    ) -> Result<DateTime<FixedOffset>> {
        self.datetime_on(t, self.local_date(now))
    }

    /// Start of bin `t` on the calendar date `date`.
    pub fn datetime_on(&self, t: usize, date: NaiveDate) -> Result<DateTime<FixedOffset>> {
        self.check_timestep(t)?;
        let offset = (t as u64 * SECONDS_IN_A_DAY).div_ceil(self.n_timestep as u64);
        Ok(self.start_of_day(date) + Duration::seconds(offset as i64))
    }

    /// Length of one timestep in seconds (may be fractional).
    pub fn timestep_seconds(&self) -> f64 {
        SECONDS_IN_A_DAY as f64 / self.n_timestep as f64
    }

    /// Number of whole timesteps spanned by `duration`.
    ///
    /// Fails unless the duration is positive and a whole multiple of the
    /// timestep length.
    pub fn duration_to_n_timesteps(&self, duration: Duration) -> Result<usize> {
        let seconds = duration.num_seconds();
        let scaled = i128::from(seconds) * self.n_timestep as i128;
        let day = i128::from(SECONDS_IN_A_DAY);
        if seconds <= 0 || scaled % day != 0 {
            return Err(Error::InvalidDuration {
                seconds,
                timestep_seconds: self.timestep_seconds().round() as i64,
            });
        }
        Ok((scaled / day) as usize)
    }

    /// Fail with `TimestepOutOfRange` unless `t < n_timestep`.
    pub fn check_timestep(&self, t: usize) -> Result<()> {
        if t >= self.n_timestep {
            return Err(Error::TimestepOutOfRange {
                timestep: t,
                n_timestep: self.n_timestep,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn hourly() -> Discretizer {
        Discretizer::with_utc_offset(24, 3600).unwrap()
    }

    #[test]
    fn same_local_time_in_different_offsets_maps_to_same_bin() {
        let d = hourly();
        let local = DateTime::parse_from_rfc3339("2024-04-02T08:30:00+01:00").unwrap();
        let utc = DateTime::parse_from_rfc3339("2024-04-02T07:30:00+00:00").unwrap();
        let tokyo = DateTime::parse_from_rfc3339("2024-04-02T16:30:00+09:00").unwrap();
        assert_eq!(d.timestep_of(&local), 8);
        assert_eq!(d.timestep_of(&utc), 8);
        assert_eq!(d.timestep_of(&tokyo), 8);
        assert_eq!(d.timestep_of(&utc.with_timezone(&Utc)), 8);
    }

    #[test]
    fn last_bin_stays_on_the_same_day() {
        let d = hourly();
        let now = DateTime::parse_from_rfc3339("2024-04-02T12:00:00+01:00").unwrap();
        let last = d.datetime_of(23, &now).unwrap();
        assert_eq!(last.date_naive(), now.date_naive());
        assert_eq!(last.hour(), 23);
        assert_eq!(d.timestep_of(&last), 23);

        let almost_midnight = DateTime::parse_from_rfc3339("2024-04-02T23:59:59+01:00").unwrap();
        assert_eq!(d.timestep_of(&almost_midnight), 23);
    }

    #[test]
    fn out_of_range_timestep_is_rejected() {
        let d = hourly();
        let now = DateTime::parse_from_rfc3339("2024-04-02T12:00:00+01:00").unwrap();
        assert!(matches!(
            d.datetime_of(24, &now),
            Err(Error::TimestepOutOfRange {
                timestep: 24,
                n_timestep: 24
            })
        ));
    }

    #[test]
    fn round_trip_with_non_divisor_bin_count() {
        let d = Discretizer::with_utc_offset(7, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        for t in 0..7 {
            let dt = d.datetime_on(t, date).unwrap();
            assert_eq!(d.timestep_of(&dt), t, "bin {t} start {dt}");
        }
    }

    #[test]
    fn duration_must_be_whole_timesteps() {
        let d = hourly();
        assert_eq!(d.duration_to_n_timesteps(Duration::hours(2)).unwrap(), 2);
        assert!(d.duration_to_n_timesteps(Duration::minutes(90)).is_err());
        assert!(d.duration_to_n_timesteps(Duration::zero()).is_err());
    }
}
