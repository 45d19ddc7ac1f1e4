//! In-memory challenge store.
//!
//! Holds a [`StoreSnapshot`] behind a shared mutex. Used by tests, the
//! simulation harness and as a staging area before writing a store file.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;

use super::snapshot::StoreSnapshot;
use crate::{
    Result,
    activity::StepRecord,
    assistant::{ChallengeUpdate, ScheduleDecision},
    challenge::Challenge,
    ports::ChallengeStore,
};

/// In-memory store; all clones share the same storage.
///
/// # Examples
///
/// ```
/// use nudge::adapters::InMemoryStore;
/// use nudge::ports::ChallengeStore;
///
/// let store = InMemoryStore::new();
/// store.add_user("alice");
/// assert!(store.challenges("alice")?.is_empty());
/// assert!(store.challenges("bob").is_err());
/// # Ok::<(), nudge::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    storage: Arc<Mutex<StoreSnapshot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            storage: Arc::new(Mutex::new(snapshot)),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().clone()
    }

    pub fn add_user(&self, user: &str) {
        self.lock().ensure_user(user);
    }

    pub fn add_challenges(&self, user: &str, challenges: impl IntoIterator<Item = Challenge>) {
        self.lock().ensure_user(user).challenges.extend(challenges);
    }

    pub fn add_step_records(&self, user: &str, records: impl IntoIterator<Item = StepRecord>) {
        self.lock().ensure_user(user).step_records.extend(records);
    }

    /// Number of committed decisions across all users.
    pub fn decision_count(&self) -> usize {
        self.lock().users.values().map(|u| u.decisions.len()).sum()
    }

    fn lock(&self) -> MutexGuard<'_, StoreSnapshot> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChallengeStore for InMemoryStore {
    fn challenges(&self, user: &str) -> Result<Vec<Challenge>> {
        Ok(self.lock().user(user)?.challenges.clone())
    }

    fn step_records(&self, user: &str) -> Result<Vec<StepRecord>> {
        Ok(self.lock().user(user)?.step_records.clone())
    }

    fn decision(&self, user: &str, date: NaiveDate) -> Result<Option<ScheduleDecision>> {
        Ok(self.lock().user(user)?.decisions.get(&date).cloned())
    }

    fn commit_schedule(
        &self,
        decision: &ScheduleDecision,
        updates: &[ChallengeUpdate],
    ) -> Result<()> {
        self.lock().commit(decision, updates)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration};
    use uuid::Uuid;

    use super::*;
    use crate::{Error, assistant::DecisionSource};

    fn challenge(offer: &str) -> Challenge {
        let offer_begin = DateTime::parse_from_rfc3339(offer).unwrap();
        let earliest = offer_begin + Duration::hours(1);
        Challenge {
            id: Uuid::new_v4(),
            offer_begin,
            offer_end: earliest,
            earliest,
            latest: earliest + Duration::hours(2),
            begin: earliest,
            end: earliest + Duration::hours(1),
            server_tag: None,
        }
    }

    fn decision(at: &str) -> ScheduleDecision {
        let decided_at = DateTime::parse_from_rfc3339(at).unwrap();
        ScheduleDecision {
            user: "alice".to_string(),
            date: decided_at.date_naive(),
            action_plan: vec![0; 24],
            selected_index: 0,
            n_candidates: 1,
            t_idx: 0,
            pos_idx: 0,
            n_observations: 0,
            source: DecisionSource::ExpectedFreeEnergy,
            server_tag: Uuid::new_v4(),
            decided_at,
        }
    }

    fn update(ch: &Challenge, tag: Uuid) -> ChallengeUpdate {
        ChallengeUpdate {
            id: ch.id,
            begin: ch.begin + Duration::hours(1),
            end: ch.end + Duration::hours(1),
            server_tag: tag,
        }
    }

    #[test]
    fn commit_rewrites_challenges_and_records_decision() {
        let store = InMemoryStore::new();
        let ch = challenge("2024-04-02T07:00:00+00:00");
        store.add_challenges("alice", [ch.clone()]);
        let decision = decision("2024-04-02T01:00:00+00:00");

        store
            .commit_schedule(&decision, &[update(&ch, decision.server_tag)])
            .unwrap();

        let stored = store.challenges("alice").unwrap();
        assert_eq!(stored[0].begin, ch.begin + Duration::hours(1));
        assert_eq!(stored[0].server_tag, Some(decision.server_tag));
        assert_eq!(store.decision("alice", decision.date).unwrap(), Some(decision));
    }

    #[test]
    fn second_decision_for_the_same_date_is_rejected() {
        let store = InMemoryStore::new();
        store.add_user("alice");
        let first = decision("2024-04-02T01:00:00+00:00");
        store.commit_schedule(&first, &[]).unwrap();
        let second = decision("2024-04-02T02:00:00+00:00");
        assert!(matches!(
            store.commit_schedule(&second, &[]),
            Err(Error::AlreadyScheduled { .. })
        ));
        assert_eq!(store.decision_count(), 1);
    }

    #[test]
    fn failed_commit_changes_nothing() {
        let store = InMemoryStore::new();
        let pending = challenge("2024-04-02T10:00:00+00:00");
        let offered = challenge("2024-04-02T07:00:00+00:00");
        store.add_challenges("alice", [pending.clone(), offered.clone()]);
        let before = store.snapshot();

        let decision = decision("2024-04-02T08:00:00+00:00");
        let tag = decision.server_tag;
        let result = store.commit_schedule(&decision, &[update(&pending, tag), update(&offered, tag)]);

        assert!(matches!(result, Err(Error::ChallengeAlreadyOffered { .. })));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn clones_share_storage() {
        let a = InMemoryStore::new();
        let b = a.clone();
        a.add_user("alice");
        assert!(b.challenges("alice").is_ok());
    }
}
