//! Enumeration of action plans compatible with a day's challenge windows.
//!
//! An action plan assigns an action to every timestep of the day (1 = the
//! challenge is active, 0 = no nudge). Each challenge window receives exactly
//! one contiguous run of ones of the challenge's duration; windows combine as
//! a Cartesian product of their individual strategies.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One action per timestep.
pub type ActionPlan = Vec<usize>;

/// A challenge expressed in timestep indices of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeWindow {
    /// Timestep in which the offer window opens.
    pub offer_begin: usize,
    /// First timestep the challenge may be active in.
    pub earliest: usize,
    /// End of the permissible window (exclusive).
    pub latest: usize,
    /// Required active duration in timesteps.
    pub duration: usize,
}

impl ChallengeWindow {
    pub fn width(&self) -> usize {
        self.latest.saturating_sub(self.earliest)
    }

    /// Fail unless the window lies within the day and its width is a whole
    /// multiple of the duration.
    pub fn validate(&self, n_timestep: usize) -> Result<()> {
        let width = self.width();
        let fits_day = self.earliest < self.latest && self.latest <= n_timestep;
        if !fits_day || self.duration == 0 || self.duration > width || width % self.duration != 0
        {
            return Err(Error::InvalidChallengeWindow {
                earliest: self.earliest,
                latest: self.latest,
                width,
                duration: self.duration,
            });
        }
        Ok(())
    }

    /// True when the offer window has opened at timestep `t_idx`.
    pub fn is_frozen_at(&self, t_idx: usize) -> bool {
        self.offer_begin <= t_idx
    }
}

/// Every placement of a single run of `duration` ones inside `width` slots,
/// ordered by increasing shift. There are exactly `width - duration + 1`.
pub fn single_challenge_strategies(width: usize, duration: usize) -> Result<Vec<ActionPlan>> {
    if duration == 0 || duration > width {
        return Err(Error::config(format!(
            "a run of {duration} timesteps cannot be placed in a window of width {width}"
        )));
    }
    Ok((0..=width - duration)
        .map(|shift| {
            let mut strategy = vec![0; width];
            strategy[shift..shift + duration].fill(1);
            strategy
        })
        .collect())
}

/// Greedy pruning: keep a strategy only when its ones are disjoint from every
/// strategy kept so far.
pub fn discard_overlapping(strategies: Vec<ActionPlan>) -> Vec<ActionPlan> {
    let mut kept: Vec<ActionPlan> = Vec::with_capacity(strategies.len());
    let mut occupied: Vec<bool> = Vec::new();
    for strategy in strategies {
        if occupied.len() < strategy.len() {
            occupied.resize(strategy.len(), false);
        }
        let collides = strategy
            .iter()
            .zip(&occupied)
            .any(|(&action, &taken)| action != 0 && taken);
        if collides {
            continue;
        }
        for (slot, &action) in occupied.iter_mut().zip(&strategy) {
            *slot |= action != 0;
        }
        kept.push(strategy);
    }
    kept
}

/// Candidate plans once part of the day has elapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanCandidates {
    /// Timestep the future suffixes start at.
    pub t_idx: usize,
    /// Whole-day plans, past included.
    pub full: Vec<ActionPlan>,
    /// `full[i][t_idx..]` for every candidate, used for evaluation.
    pub future: Vec<ActionPlan>,
    /// `starts[i][w]`: first active timestep of window `w` in plan `i`, if any.
    pub starts: Vec<Vec<Option<usize>>>,
}

impl PlanCandidates {
    pub fn len(&self) -> usize {
        self.full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActionPlanGenerator {
    n_timestep: usize,
    discard_overlapping: bool,
}

impl ActionPlanGenerator {
    pub fn new(n_timestep: usize) -> Self {
        Self {
            n_timestep,
            discard_overlapping: false,
        }
    }

    /// Prune overlapping single-challenge strategies before combining.
    pub fn with_discard_overlapping(mut self, discard: bool) -> Self {
        self.discard_overlapping = discard;
        self
    }

    pub fn n_timestep(&self) -> usize {
        self.n_timestep
    }

    /// Strategies available to one window.
    pub fn strategies_for(&self, window: &ChallengeWindow) -> Result<Vec<ActionPlan>> {
        window.validate(self.n_timestep)?;
        let strategies = single_challenge_strategies(window.width(), window.duration)?;
        Ok(if self.discard_overlapping {
            discard_overlapping(strategies)
        } else {
            strategies
        })
    }

    /// All whole-day plans for the windows, ignoring elapsed time.
    pub fn generate(&self, windows: &[ChallengeWindow]) -> Result<Vec<ActionPlan>> {
        let parts = windows
            .iter()
            .map(|window| Ok((*window, self.strategies_for(window)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .combine(&parts)
            .into_iter()
            .map(|(plan, _)| plan)
            .collect())
    }

    /// Plans compatible with what already happened today.
    ///
    /// Windows whose offer opened at or before `now_t_idx` are frozen to the
    /// actions in `taken` (a whole-day action vector read from history); the
    /// others are enumerated as usual.
    pub fn generate_from(
        &self,
        windows: &[ChallengeWindow],
        now_t_idx: usize,
        taken: &[usize],
    ) -> Result<PlanCandidates> {
        if now_t_idx >= self.n_timestep {
            return Err(Error::TimestepOutOfRange {
                timestep: now_t_idx,
                n_timestep: self.n_timestep,
            });
        }
        if taken.len() != self.n_timestep {
            return Err(Error::ShapeMismatch {
                context: "actions taken today".to_string(),
                expected: self.n_timestep,
                got: taken.len(),
            });
        }
        let parts = windows
            .iter()
            .map(|window| {
                if window.is_frozen_at(now_t_idx) {
                    window.validate(self.n_timestep)?;
                    Ok((*window, vec![taken[window.earliest..window.latest].to_vec()]))
                } else {
                    Ok((*window, self.strategies_for(window)?))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let (full, starts): (Vec<ActionPlan>, Vec<Vec<Option<usize>>>) =
            self.combine(&parts).into_iter().unzip();
        let future = full.iter().map(|plan| plan[now_t_idx..].to_vec()).collect();
        Ok(PlanCandidates {
            t_idx: now_t_idx,
            full,
            future,
            starts,
        })
    }

    fn combine(
        &self,
        parts: &[(ChallengeWindow, Vec<ActionPlan>)],
    ) -> Vec<(ActionPlan, Vec<Option<usize>>)> {
        let mut plans = vec![(vec![0; self.n_timestep], Vec::with_capacity(parts.len()))];
        for (window, strategies) in parts {
            let range = window.earliest..window.latest;
            let mut next = Vec::with_capacity(plans.len() * strategies.len());
            for (plan, starts) in &plans {
                for strategy in strategies {
                    let collides = plan[range.clone()]
                        .iter()
                        .zip(strategy)
                        .any(|(&existing, &action)| existing != 0 && action != 0);
                    if collides {
                        continue;
                    }
                    let mut combined = plan.clone();
                    for (slot, &action) in combined[range.clone()].iter_mut().zip(strategy) {
                        if action != 0 {
                            *slot = action;
                        }
                    }
                    let mut placed = starts.clone();
                    placed.push(
                        strategy
                            .iter()
                            .position(|&a| a != 0)
                            .map(|shift| window.earliest + shift),
                    );
                    next.push((combined, placed));
                }
            }
            plans = next;
        }
        plans
    }
}
