//! Serializable store contents shared by the adapters.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    activity::StepRecord,
    assistant::{ChallengeUpdate, ScheduleDecision},
    challenge::Challenge,
};

/// Everything stored for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub challenges: Vec<Challenge>,
    pub step_records: Vec<StepRecord>,
    pub decisions: BTreeMap<NaiveDate, ScheduleDecision>,
}

/// All users of a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub users: BTreeMap<String, UserRecord>,
}

impl StoreSnapshot {
    pub fn user(&self, user: &str) -> Result<&UserRecord> {
        self.users.get(user).ok_or_else(|| Error::UnknownUser {
            user: user.to_string(),
        })
    }

    pub fn user_mut(&mut self, user: &str) -> Result<&mut UserRecord> {
        self.users.get_mut(user).ok_or_else(|| Error::UnknownUser {
            user: user.to_string(),
        })
    }

    /// Add the user if missing; existing records are kept.
    pub fn ensure_user(&mut self, user: &str) -> &mut UserRecord {
        self.users.entry(user.to_string()).or_default()
    }

    /// Validate every part of the commit, then apply it.
    pub fn commit(&mut self, decision: &ScheduleDecision, updates: &[ChallengeUpdate]) -> Result<()> {
        let record = self.user_mut(&decision.user)?;
        if record.decisions.contains_key(&decision.date) {
            return Err(Error::AlreadyScheduled {
                user: decision.user.clone(),
                date: decision.date,
            });
        }

        let mut targets = Vec::with_capacity(updates.len());
        for update in updates {
            let idx = record
                .challenges
                .iter()
                .position(|c| c.id == update.id)
                .ok_or_else(|| Error::UnknownChallenge {
                    user: decision.user.clone(),
                    id: update.id,
                })?;
            if record.challenges[idx].offer_begin <= decision.decided_at {
                return Err(Error::ChallengeAlreadyOffered { id: update.id });
            }
            targets.push(idx);
        }

        for (idx, update) in targets.into_iter().zip(updates) {
            let challenge = &mut record.challenges[idx];
            challenge.begin = update.begin;
            challenge.end = update.end;
            challenge.server_tag = Some(update.server_tag);
        }
        record.decisions.insert(decision.date, decision.clone());
        Ok(())
    }
}
