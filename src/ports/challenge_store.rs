//! Persistence port for challenges, step history and schedule decisions.

use chrono::NaiveDate;

use crate::{
    Result,
    activity::StepRecord,
    assistant::{ChallengeUpdate, ScheduleDecision},
    challenge::Challenge,
};

/// Port through which the assistant reads a user's history and commits
/// schedules.
///
/// Implementations must make [`commit_schedule`](Self::commit_schedule)
/// all-or-nothing: either the decision and every challenge update are stored,
/// or nothing changes.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use nudge::ports::ChallengeStore;
///
/// fn already_decided<S: ChallengeStore + ?Sized>(
///     store: &S,
///     user: &str,
///     date: NaiveDate,
/// ) -> nudge::Result<bool> {
///     Ok(store.decision(user, date)?.is_some())
/// }
/// ```
pub trait ChallengeStore {
    /// Every challenge of the user, all dates included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownUser`](crate::Error::UnknownUser) when the user
    /// does not exist.
    fn challenges(&self, user: &str) -> Result<Vec<Challenge>>;

    /// Every step record of the user.
    fn step_records(&self, user: &str) -> Result<Vec<StepRecord>>;

    /// Decision committed for `date`, if any.
    fn decision(&self, user: &str, date: NaiveDate) -> Result<Option<ScheduleDecision>>;

    /// Store the decision and rewrite the challenges atomically.
    ///
    /// # Errors
    ///
    /// Fails without applying anything when a decision already exists for the
    /// date, when an update names an unknown challenge, or when a challenge's
    /// offer window opened before the decision time.
    fn commit_schedule(&self, decision: &ScheduleDecision, updates: &[ChallengeUpdate])
    -> Result<()>;
}
