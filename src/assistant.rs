//! Belief update and scheduling for one user and day.
//!
//! An invocation reads the user's history through the [`ChallengeStore`] port,
//! rebuilds the pseudo-counts, enumerates the plans compatible with what has
//! already happened today, picks one and commits the new challenge times
//! together with the decision record. Once a decision exists for a date every
//! later invocation on that date is a no-op.

pub mod outcome;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info};
use uuid::Uuid;

pub use outcome::{
    ChallengeUpdate, DayState, DecisionSource, IdleReason, ScheduleDecision, ScheduleOutcome,
};

use crate::{
    Error, Result,
    action_plan::{ActionPlanGenerator, ChallengeWindow},
    activity::{HistoryExtractor, StepRecord},
    app::AssistantConfig,
    challenge::Challenge,
    efe::{EfeParameters, select_action_plan},
    ports::ChallengeStore,
    pseudo_counts::PseudoCounts,
    timestep::Discretizer,
};

/// The scheduling assistant.
pub struct Assistant {
    store: Arc<dyn ChallengeStore + Send + Sync>,
    config: AssistantConfig,
    discretizer: Discretizer,
    extractor: HistoryExtractor,
    generator: ActionPlanGenerator,
    params: EfeParameters,
}

impl Assistant {
    /// Validate the configuration and wire the assistant to a store.
    pub fn new(store: Arc<dyn ChallengeStore + Send + Sync>, config: AssistantConfig) -> Result<Self> {
        config.validate()?;
        let discretizer = config.discretizer()?;
        let extractor = HistoryExtractor::new(discretizer, config.position_axis()?);
        let generator = ActionPlanGenerator::new(config.n_timestep)
            .with_discard_overlapping(config.discard_overlapping);
        let params = config.efe_parameters();
        Ok(Self {
            store,
            config,
            discretizer,
            extractor,
            generator,
            params,
        })
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn discretizer(&self) -> &Discretizer {
        &self.discretizer
    }

    /// Scheduling state of `user` on the local date of `now`.
    pub fn day_state(&self, user: &str, now: &DateTime<FixedOffset>) -> Result<DayState> {
        let today = self.discretizer.local_date(now);
        let challenges = self.challenges_on(user, today)?;
        let state = self.classify(user, today, now, &challenges)?;
        Ok(state)
    }

    /// Pseudo-counts from the prior and every transition observed up to `now`.
    pub fn pseudo_counts(&self, user: &str, now: &DateTime<FixedOffset>) -> Result<PseudoCounts> {
        let records = self.store.step_records(user)?;
        self.beliefs(user, &records, now)
    }

    /// Run the scheduling pipeline for `user` at `now`.
    ///
    /// Commits at most one decision per user and local date; later calls on
    /// the same date return [`ScheduleOutcome::Idle`] without touching the
    /// store.
    pub fn update_beliefs(
        &self,
        user: &str,
        now: &DateTime<FixedOffset>,
    ) -> Result<ScheduleOutcome> {
        let now = self.discretizer.local(now);
        let today = now.date_naive();
        let challenges = self.challenges_on(user, today)?;

        if let DayState::Idle(reason) = self.classify(user, today, &now, &challenges)? {
            info!(user, %today, ?reason, "nothing to schedule");
            return Ok(ScheduleOutcome::Idle(reason));
        }

        let now_t = self.discretizer.timestep_of(&now);
        let records = self.store.step_records(user)?;
        let counts = self.beliefs(user, &records, &now)?;
        let pos_idx = self.extractor.current_position(&records, &now);
        debug!(
            user,
            n_observations = counts.observation_count(),
            now_t,
            pos_idx,
            "beliefs updated"
        );

        let windows = challenges
            .iter()
            .map(|c| c.window(&self.discretizer))
            .collect::<Result<Vec<ChallengeWindow>>>()?;
        let taken = self.extractor.actions_on(&challenges, today)?;
        let candidates = self.generator.generate_from(&windows, now_t, &taken)?;
        if candidates.is_empty() {
            return Err(Error::NoActionPlans);
        }

        let (index, source) = match self.config.heuristic {
            Some(index) if index >= candidates.len() => {
                return Err(Error::HeuristicOutOfRange {
                    index,
                    n_candidates: candidates.len(),
                });
            }
            Some(index) => (index, DecisionSource::Heuristic),
            None => {
                let mut rng = StdRng::seed_from_u64(self.config.seed);
                let selection = select_action_plan(
                    &counts,
                    pos_idx,
                    now_t,
                    &self.params,
                    &candidates.future,
                    &mut rng,
                )?;
                (selection.index, DecisionSource::ExpectedFreeEnergy)
            }
        };

        let server_tag = Uuid::new_v4();
        let mut updates = Vec::new();
        for ((challenge, window), start) in challenges
            .iter()
            .zip(&windows)
            .zip(&candidates.starts[index])
        {
            if window.is_frozen_at(now_t) {
                continue;
            }
            let Some(start) = *start else { continue };
            let begin = self.discretizer.datetime_on(start, today)?;
            updates.push(ChallengeUpdate {
                id: challenge.id,
                begin,
                end: begin + challenge.duration(),
                server_tag,
            });
        }

        let decision = ScheduleDecision {
            user: user.to_string(),
            date: today,
            action_plan: candidates.full[index].clone(),
            selected_index: index,
            n_candidates: candidates.len(),
            t_idx: now_t,
            pos_idx,
            n_observations: counts.observation_count(),
            source,
            server_tag,
            decided_at: now,
        };
        self.store.commit_schedule(&decision, &updates)?;
        info!(
            user,
            %today,
            selected = index,
            n_candidates = decision.n_candidates,
            n_updated = updates.len(),
            ?source,
            "schedule committed"
        );
        Ok(ScheduleOutcome::Scheduled { decision, updates })
    }

    /// Prior counts plus every transition observed up to `now`.
    fn beliefs(
        &self,
        user: &str,
        records: &[StepRecord],
        now: &DateTime<FixedOffset>,
    ) -> Result<PseudoCounts> {
        let challenges = self.store.challenges(user)?;
        let observations = self.extractor.observations(records, &challenges, now)?;
        let mut counts = self.config.prior_counts()?;
        counts.absorb(&observations.actions, &observations.positions)?;
        debug!(
            user,
            n_days = observations.n_days(),
            n_transitions = observations.n_transitions(),
            "observations absorbed"
        );
        Ok(counts)
    }

    /// Challenges whose permissible window starts on `date`, by earliest start.
    fn challenges_on(&self, user: &str, date: NaiveDate) -> Result<Vec<Challenge>> {
        let mut challenges: Vec<Challenge> = self
            .store
            .challenges(user)?
            .into_iter()
            .filter(|c| self.discretizer.local_date(&c.earliest) == date)
            .collect();
        challenges.sort_by_key(|c| c.earliest);
        Ok(challenges)
    }

    fn classify(
        &self,
        user: &str,
        today: NaiveDate,
        now: &DateTime<FixedOffset>,
        challenges: &[Challenge],
    ) -> Result<DayState> {
        if challenges.is_empty() {
            return Ok(DayState::Idle(IdleReason::NoChallengesToday));
        }
        if self.store.decision(user, today)?.is_some() {
            return Ok(DayState::Idle(IdleReason::AlreadyDecided));
        }
        let now_t = self.discretizer.timestep_of(now);
        let mut any_future = false;
        for challenge in challenges {
            let window = challenge.window(&self.discretizer)?;
            if !challenge.is_offered(now) && !window.is_frozen_at(now_t) {
                any_future = true;
                break;
            }
        }
        if !any_future {
            return Ok(DayState::Idle(IdleReason::NoFutureChallenges));
        }
        Ok(DayState::AwaitingFirstSlot)
    }
}
