//! Expected-free-energy evaluation of action plans.
//!
//! Each candidate plan is rolled forward from the current belief `(pos_idx,
//! t_idx)` through the expected transitions of the pseudo-count model. Two
//! quantities are accumulated along the rollout:
//!
//! - **pragmatic value**: `Σ_h qp_h · log_prior_position`, how much the
//!   predicted positions agree with the preferred ones;
//! - **epistemic value**: `Σ_h (qp_{h-1} · W) · qp_h` with
//!   `W = 1/(2α) − 1/(2 Σ α)`, the expected reduction in uncertainty about the
//!   transition parameters.
//!
//! The expected free energy is `gamma · epistemic + pragmatic`; the plan with
//! the highest value wins, ties (within [`is_close`]) being broken uniformly at
//! random with the caller's RNG.

use ndarray::{Array1, Array4, Axis, s};
use rand::{Rng, seq::IndexedRandom};
use tracing::{debug, warn};

use crate::{
    Error, Result,
    pseudo_counts::{PseudoCounts, normalize_last_axis},
    utils::{is_close, sample_categorical, softmax},
};

/// Log-preference over positions: `ln softmax(slope · index)`.
///
/// A positive slope prefers higher step counts.
///
/// # Examples
///
/// ```
/// use nudge::efe::log_prior_position;
///
/// let prior = log_prior_position(3, 2.0);
/// assert!(prior[0] < prior[1] && prior[1] < prior[2]);
/// let total: f64 = prior.iter().map(|v| v.exp()).sum();
/// assert!((total - 1.0).abs() < 1e-12);
/// ```
pub fn log_prior_position(n_position: usize, slope: f64) -> Vec<f64> {
    let scores: Vec<f64> = (0..n_position).map(|i| slope * i as f64).collect();
    softmax(&scores).into_iter().map(f64::ln).collect()
}

/// Preferences and weighting used to score plans.
#[derive(Debug, Clone, PartialEq)]
pub struct EfeParameters {
    pub log_prior_position: Vec<f64>,
    pub gamma: f64,
}

impl EfeParameters {
    pub fn new(log_prior_position: Vec<f64>, gamma: f64) -> Self {
        Self {
            log_prior_position,
            gamma,
        }
    }

    /// Parameters with a softmax prior of the given slope.
    pub fn with_slope(n_position: usize, slope: f64, gamma: f64) -> Self {
        Self::new(log_prior_position(n_position, slope), gamma)
    }
}

/// Which score the selection ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFallback {
    /// `gamma · epistemic + pragmatic`.
    Combined,
    /// Pragmatic had no finite value.
    EpistemicOnly,
    /// Epistemic had no finite value.
    PragmaticOnly,
    /// No usable score; uniform choice over all candidates.
    Uniform,
}

/// Per-plan scores before selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanScores {
    pub pragmatic: Vec<f64>,
    pub epistemic: Vec<f64>,
}

impl PlanScores {
    pub fn len(&self) -> usize {
        self.pragmatic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pragmatic.is_empty()
    }

    /// Combined score and the fallback that produced it.
    pub fn efe(&self, gamma: f64) -> (Vec<f64>, ScoreFallback) {
        let pragmatic_unusable = self.pragmatic.iter().all(|v| !v.is_finite());
        let epistemic_unusable = self.epistemic.iter().all(|v| !v.is_finite());
        match (pragmatic_unusable, epistemic_unusable) {
            (true, true) => (vec![1.0; self.len()], ScoreFallback::Uniform),
            (true, false) => (self.epistemic.clone(), ScoreFallback::EpistemicOnly),
            (false, true) => (self.pragmatic.clone(), ScoreFallback::PragmaticOnly),
            (false, false) => (
                self.epistemic
                    .iter()
                    .zip(&self.pragmatic)
                    .map(|(e, p)| gamma * e + p)
                    .collect(),
                ScoreFallback::Combined,
            ),
        }
    }
}

/// Outcome of [`select_action_plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySelection {
    /// Index into the candidate plans.
    pub index: usize,
    pub pragmatic: Vec<f64>,
    pub epistemic: Vec<f64>,
    pub efe: Vec<f64>,
    pub fallback: ScoreFallback,
}

/// Score every plan starting from position `pos_idx` at timestep `t_idx`.
///
/// Plans must share one horizon `h` with `t_idx + h <= n_timestep`.
pub fn evaluate_action_plans(
    counts: &PseudoCounts,
    pos_idx: usize,
    t_idx: usize,
    log_prior_position: &[f64],
    plans: &[Vec<usize>],
) -> Result<PlanScores> {
    let horizon = check_inputs(counts, pos_idx, t_idx, log_prior_position, plans)?;
    let n_position = counts.n_position();

    let alpha = counts.alpha();
    let qt = normalize_last_axis(alpha);
    let w = epistemic_weights(alpha);
    let log_prior = Array1::from(log_prior_position.to_vec());

    let mut pragmatic = Vec::with_capacity(plans.len());
    let mut epistemic = Vec::with_capacity(plans.len());
    for plan in plans {
        let mut qp = Array1::<f64>::zeros(n_position);
        qp[pos_idx] = 1.0;
        let mut plan_pragmatic = 0.0;
        let mut plan_epistemic = 0.0;
        for (h_idx, &a) in plan.iter().enumerate().take(horizon) {
            let t = t_idx + h_idx;
            let previous = qp;
            qp = previous.dot(&qt.slice(s![a, t, .., ..]));
            plan_epistemic += previous.dot(&w.slice(s![a, t, .., ..])).dot(&qp);
            plan_pragmatic += qp.dot(&log_prior);
        }
        pragmatic.push(plan_pragmatic);
        epistemic.push(plan_epistemic);
    }
    Ok(PlanScores {
        pragmatic,
        epistemic,
    })
}

/// Pick the plan with the highest expected free energy.
///
/// NaN scores never win. When no candidate has a usable score the choice is
/// uniform over all plans.
pub fn select_action_plan<R: Rng>(
    counts: &PseudoCounts,
    pos_idx: usize,
    t_idx: usize,
    params: &EfeParameters,
    plans: &[Vec<usize>],
    rng: &mut R,
) -> Result<PolicySelection> {
    debug!(
        t_idx,
        pos_idx,
        n_observations = counts.observation_count(),
        n_plans = plans.len(),
        "evaluating action plans"
    );
    let scores = evaluate_action_plans(counts, pos_idx, t_idx, &params.log_prior_position, plans)?;
    select_from_scores(scores, params.gamma, rng)
}

/// Pick the best plan from precomputed scores, applying the non-finite
/// fallbacks of [`PlanScores::efe`].
pub fn select_from_scores<R: Rng>(
    scores: PlanScores,
    gamma: f64,
    rng: &mut R,
) -> Result<PolicySelection> {
    let (efe, fallback) = scores.efe(gamma);
    match fallback {
        ScoreFallback::Combined => {}
        ScoreFallback::EpistemicOnly => warn!("pragmatic values are all non-finite; using epistemic"),
        ScoreFallback::PragmaticOnly => warn!("epistemic values are all non-finite; using pragmatic"),
        ScoreFallback::Uniform => warn!("all values are non-finite; choosing uniformly"),
    }

    let mut candidates = best_candidates(&efe);
    if candidates.is_empty() {
        warn!("no comparable expected free energy; choosing uniformly");
        candidates = (0..efe.len()).collect();
    }
    let index = *candidates.choose(rng).ok_or(Error::NoActionPlans)?;
    debug!(index, n_tied = candidates.len(), "selected action plan");

    Ok(PolicySelection {
        index,
        pragmatic: scores.pragmatic,
        epistemic: scores.epistemic,
        efe,
        fallback,
    })
}

/// Take the plan's action at `t_idx` and sample the next position from
/// `transition[action, t_idx, pos_idx, :]`.
pub fn make_a_step<R: Rng>(
    t_idx: usize,
    plan: &[usize],
    pos_idx: usize,
    transition: &Array4<f64>,
    rng: &mut R,
) -> Result<(usize, usize)> {
    let (n_action, n_timestep, n_position, _) = transition.dim();
    let action = *plan.get(t_idx).ok_or(Error::TimestepOutOfRange {
        timestep: t_idx,
        n_timestep: plan.len(),
    })?;
    if t_idx >= n_timestep {
        return Err(Error::TimestepOutOfRange {
            timestep: t_idx,
            n_timestep,
        });
    }
    if action >= n_action {
        return Err(Error::ActionOutOfRange { action, n_action });
    }
    if pos_idx >= n_position {
        return Err(Error::PositionOutOfRange {
            position: pos_idx,
            n_position,
        });
    }
    let row = transition.slice(s![action, t_idx, pos_idx, ..]);
    let weights: Vec<f64> = row.iter().copied().collect();
    Ok((action, sample_categorical(&weights, rng)))
}

/// `W[a,t,p,p'] = 1/(2α) − 1/(2 Σ_{p'} α)`, zero where `α == 0`.
fn epistemic_weights(alpha: &Array4<f64>) -> Array4<f64> {
    let sums = alpha.sum_axis(Axis(3));
    Array4::from_shape_fn(alpha.dim(), |(a, t, p, q)| {
        let value = alpha[[a, t, p, q]];
        if value == 0.0 {
            0.0
        } else {
            1.0 / (2.0 * value) - 1.0 / (2.0 * sums[[a, t, p]])
        }
    })
}

fn best_candidates(efe: &[f64]) -> Vec<usize> {
    let max = efe
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);
    let has_comparable = efe.iter().any(|v| !v.is_nan());
    if !has_comparable {
        return Vec::new();
    }
    efe.iter()
        .enumerate()
        .filter(|(_, v)| is_close(**v, max))
        .map(|(i, _)| i)
        .collect()
}

fn check_inputs(
    counts: &PseudoCounts,
    pos_idx: usize,
    t_idx: usize,
    log_prior_position: &[f64],
    plans: &[Vec<usize>],
) -> Result<usize> {
    let first = plans.first().ok_or(Error::NoActionPlans)?;
    let horizon = first.len();
    if let Some(ragged) = plans.iter().find(|p| p.len() != horizon) {
        return Err(Error::ShapeMismatch {
            context: "action plan horizon".to_string(),
            expected: horizon,
            got: ragged.len(),
        });
    }
    let n_timestep = counts.n_timestep();
    if t_idx + horizon > n_timestep {
        return Err(Error::HorizonOverflow {
            t_idx,
            horizon,
            n_timestep,
        });
    }
    let n_action = counts.n_action();
    if let Some(&action) = plans.iter().flatten().find(|&&a| a >= n_action) {
        return Err(Error::ActionOutOfRange { action, n_action });
    }
    let n_position = counts.n_position();
    if pos_idx >= n_position {
        return Err(Error::PositionOutOfRange {
            position: pos_idx,
            n_position,
        });
    }
    if log_prior_position.len() != n_position {
        return Err(Error::ShapeMismatch {
            context: "log prior over positions".to_string(),
            expected: n_position,
            got: log_prior_position.len(),
        });
    }
    Ok(horizon)
}
