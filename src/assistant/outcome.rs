//! Records produced by a scheduling run.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why an invocation left the day untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleReason {
    /// The user has no challenge on this date.
    NoChallengesToday,
    /// A schedule was already committed for this date.
    AlreadyDecided,
    /// Every challenge of the date has already been offered.
    NoFutureChallenges,
}

/// Scheduling state of one user on one local date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    /// Nothing decided yet and at least one challenge is still unoffered.
    AwaitingFirstSlot,
    Idle(IdleReason),
}

/// How the committed plan was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    ExpectedFreeEnergy,
    Heuristic,
}

/// The persisted decision for one user and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDecision {
    pub user: String,
    pub date: NaiveDate,
    /// Whole-day plan, elapsed timesteps included.
    pub action_plan: Vec<usize>,
    pub selected_index: usize,
    pub n_candidates: usize,
    /// Timestep the evaluation started from.
    pub t_idx: usize,
    /// Position index the evaluation started from.
    pub pos_idx: usize,
    pub n_observations: usize,
    pub source: DecisionSource,
    pub server_tag: Uuid,
    pub decided_at: DateTime<FixedOffset>,
}

/// New active window for one challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeUpdate {
    pub id: Uuid,
    pub begin: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub server_tag: Uuid,
}

/// Result of [`Assistant::update_beliefs`](crate::assistant::Assistant::update_beliefs).
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome {
    Idle(IdleReason),
    Scheduled {
        decision: ScheduleDecision,
        updates: Vec<ChallengeUpdate>,
    },
}

impl ScheduleOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, ScheduleOutcome::Scheduled { .. })
    }

    pub fn decision(&self) -> Option<&ScheduleDecision> {
        match self {
            ScheduleOutcome::Scheduled { decision, .. } => Some(decision),
            ScheduleOutcome::Idle(_) => None,
        }
    }
}
