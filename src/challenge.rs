//! Challenge records and the daily layout they are generated from.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, action_plan::ChallengeWindow, timestep::Discretizer};

/// A rewarded walking task owned by a user.
///
/// `[offer_begin, offer_end]` is when the challenge is offered,
/// `[earliest, latest]` bounds where it may be active and `[begin, end]` is
/// the active window the assistant schedules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub offer_begin: DateTime<FixedOffset>,
    pub offer_end: DateTime<FixedOffset>,
    pub earliest: DateTime<FixedOffset>,
    pub latest: DateTime<FixedOffset>,
    pub begin: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// Set whenever the server rewrites the schedule; clients use it to sync.
    pub server_tag: Option<Uuid>,
}

impl Challenge {
    /// Length of the active window.
    pub fn duration(&self) -> Duration {
        self.end - self.begin
    }

    /// True once the offer window has opened at `now`.
    pub fn is_offered(&self, now: &DateTime<FixedOffset>) -> bool {
        self.offer_begin <= *now
    }

    /// Timestep view of the challenge used by the action-plan generator.
    ///
    /// An offer opened before the local date of `earliest` maps to timestep 0.
    pub fn window(&self, discretizer: &Discretizer) -> Result<ChallengeWindow> {
        let day = discretizer.local_date(&self.earliest);
        let offer_begin = if discretizer.local_date(&self.offer_begin) < day {
            0
        } else {
            discretizer.timestep_of(&self.offer_begin)
        };
        let earliest = discretizer.timestep_of(&self.earliest);
        let latest = if discretizer.local_date(&self.latest) > day {
            discretizer.n_timestep()
        } else {
            discretizer.timestep_of(&self.latest)
        };
        Ok(ChallengeWindow {
            offer_begin,
            earliest,
            latest,
            duration: discretizer.duration_to_n_timesteps(self.duration())?,
        })
    }
}

/// Daily arrangement of challenges, expressed in hours.
///
/// The first challenge is offered at `first_offer`; it may become active
/// `offer_window_hours` later and must fit within `challenge_window_hours`.
/// Each following challenge starts where the previous window closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeLayout {
    pub first_offer: NaiveTime,
    pub offer_window_hours: i64,
    pub challenge_window_hours: i64,
    pub challenge_duration_hours: i64,
    pub challenges_per_day: usize,
}

impl Default for ChallengeLayout {
    fn default() -> Self {
        Self {
            first_offer: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            offer_window_hours: 1,
            challenge_window_hours: 2,
            challenge_duration_hours: 1,
            challenges_per_day: 1,
        }
    }
}

impl ChallengeLayout {
    pub fn validate(&self) -> Result<()> {
        if self.offer_window_hours < 0 {
            return Err(Error::config("offer window must not be negative"));
        }
        if self.challenge_duration_hours <= 0 {
            return Err(Error::config("challenge duration must be positive"));
        }
        if self.challenge_window_hours < self.challenge_duration_hours
            || self.challenge_window_hours % self.challenge_duration_hours != 0
        {
            return Err(Error::config(format!(
                "challenge window of {}h must be a multiple of the {}h challenge duration",
                self.challenge_window_hours, self.challenge_duration_hours
            )));
        }
        if self.challenges_per_day == 0 {
            return Err(Error::config("at least one challenge per day is required"));
        }
        Ok(())
    }

    /// Challenges for `date`, with provisional `begin/end` at each window start.
    pub fn challenges_on(
        &self,
        date: NaiveDate,
        discretizer: &Discretizer,
    ) -> Result<Vec<Challenge>> {
        self.validate()?;
        let offer_window = Duration::hours(self.offer_window_hours);
        let challenge_window = Duration::hours(self.challenge_window_hours);
        let duration = Duration::hours(self.challenge_duration_hours);
        let first_offer = discretizer.start_of_day(date)
            + (self.first_offer - NaiveTime::MIN);
        let day_end = discretizer.start_of_day(date) + Duration::days(1);

        (0..self.challenges_per_day)
            .map(|i| {
                let offer_begin = first_offer + (offer_window + challenge_window) * i as i32;
                let earliest = offer_begin + offer_window;
                let latest = earliest + challenge_window;
                if latest > day_end {
                    return Err(Error::config(format!(
                        "challenge {i} ends at {latest}, after the end of {date}"
                    )));
                }
                Ok(Challenge {
                    id: Uuid::new_v4(),
                    offer_begin,
                    offer_end: earliest,
                    earliest,
                    latest,
                    begin: earliest,
                    end: earliest + duration,
                    server_tag: None,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn default_layout_offers_at_seven_and_allows_eight_to_ten() {
        let discretizer = Discretizer::with_utc_offset(24, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let challenges = ChallengeLayout::default()
            .challenges_on(date, &discretizer)
            .unwrap();
        assert_eq!(challenges.len(), 1);
        let ch = &challenges[0];
        assert_eq!(ch.offer_begin.hour(), 7);
        assert_eq!(ch.earliest.hour(), 8);
        assert_eq!(ch.latest.hour(), 10);
        assert_eq!(ch.duration(), Duration::hours(1));

        let window = ch.window(&discretizer).unwrap();
        assert_eq!(
            window,
            ChallengeWindow {
                offer_begin: 7,
                earliest: 8,
                latest: 10,
                duration: 1
            }
        );
    }

    #[test]
    fn offer_from_the_previous_day_is_frozen_from_midnight() {
        let discretizer = Discretizer::with_utc_offset(24, 0).unwrap();
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap();
        let earliest = at("2024-04-02T00:30:00+00:00");
        let challenge = Challenge {
            id: Uuid::new_v4(),
            offer_begin: at("2024-04-01T23:30:00+00:00"),
            offer_end: earliest,
            earliest,
            latest: earliest + Duration::hours(2),
            begin: earliest,
            end: earliest + Duration::hours(1),
            server_tag: None,
        };
        let window = challenge.window(&discretizer).unwrap();
        assert_eq!(window.offer_begin, 0);
        assert!(window.is_frozen_at(0));
        assert!(challenge.is_offered(&at("2024-04-02T00:10:00+00:00")));
    }

    #[test]
    fn successive_challenges_are_spaced_by_offer_and_window() {
        let discretizer = Discretizer::with_utc_offset(24, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let layout = ChallengeLayout {
            challenges_per_day: 3,
            ..ChallengeLayout::default()
        };
        let hours: Vec<u32> = layout
            .challenges_on(date, &discretizer)
            .unwrap()
            .iter()
            .map(|c| c.earliest.hour())
            .collect();
        assert_eq!(hours, vec![8, 11, 14]);
    }

    #[test]
    fn layout_overflowing_the_day_is_rejected() {
        let discretizer = Discretizer::with_utc_offset(24, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let layout = ChallengeLayout {
            challenges_per_day: 8,
            ..ChallengeLayout::default()
        };
        assert!(layout.challenges_on(date, &discretizer).is_err());
    }

    #[test]
    fn window_not_multiple_of_duration_is_rejected() {
        let layout = ChallengeLayout {
            challenge_window_hours: 3,
            challenge_duration_hours: 2,
            ..ChallengeLayout::default()
        };
        assert!(layout.validate().is_err());
    }
}
