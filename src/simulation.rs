//! Offline evaluation of the assistant against synthetic users.
//!
//! A synthetic user is a ground-truth transition tensor with the same shape as
//! the pseudo-counts. Each simulated day the assistant picks a whole-day plan
//! from midnight, the user's positions are sampled from the ground truth under
//! that plan, and every transition is absorbed into the counts. The learning
//! error is the mean absolute difference between the ground truth and the
//! normalised counts.

use std::collections::HashMap;

use ndarray::{Array4, Zip, s};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Error, Result,
    app::AssistantConfig,
    efe::{make_a_step, select_action_plan},
    ports::SimulationObserver,
    position::PositionAxis,
    position_prior::PositionKernel,
    pseudo_counts::{PseudoCounts, normalize_last_axis},
};

/// Parameters of a synthetic user whose step count never decreases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticUser {
    /// Steps walked over the waking part of a day without nudges.
    pub daily_steps: f64,
    /// Extra steps per timestep while a challenge is active.
    pub nudge_steps: f64,
    /// Spread of the per-timestep step gain.
    pub sigma: f64,
    /// First waking hour (inclusive).
    pub wake_hour: u32,
    /// First sleeping hour (exclusive end of waking time).
    pub sleep_hour: u32,
}

impl Default for SyntheticUser {
    fn default() -> Self {
        Self {
            daily_steps: 7_000.0,
            nudge_steps: 1_500.0,
            sigma: 1_000.0,
            wake_hour: 7,
            sleep_hour: 22,
        }
    }
}

impl SyntheticUser {
    fn is_awake(&self, t: usize, n_timestep: usize) -> bool {
        let hour = (t * 24 / n_timestep) as u32;
        hour >= self.wake_hour && hour < self.sleep_hour
    }

    /// Ground-truth transitions `T[a][t][p][p']` built from monotone
    /// Gaussian kernels.
    pub fn transition(
        &self,
        axis: &PositionAxis,
        n_action: usize,
        n_timestep: usize,
    ) -> Result<Array4<f64>> {
        if self.wake_hour >= self.sleep_hour || self.sleep_hour > 24 {
            return Err(Error::config(format!(
                "waking hours [{}, {}) are not a valid part of a day",
                self.wake_hour, self.sleep_hour
            )));
        }
        let n_awake = (0..n_timestep)
            .filter(|&t| self.is_awake(t, n_timestep))
            .count()
            .max(1);
        let base_drift = self.daily_steps / n_awake as f64;

        let n_position = axis.len();
        let mut transition = Array4::<f64>::zeros((n_action, n_timestep, n_position, n_position));
        let mut kernels: HashMap<u64, PositionKernel> = HashMap::new();
        for a in 0..n_action {
            for t in 0..n_timestep {
                let mut drift = if self.is_awake(t, n_timestep) {
                    base_drift
                } else {
                    0.0
                };
                drift += a as f64 * self.nudge_steps;
                let key = drift.to_bits();
                if !kernels.contains_key(&key) {
                    let kernel = PositionKernel::gaussian(axis, drift, self.sigma)?.monotone();
                    kernels.insert(key, kernel);
                }
                transition
                    .slice_mut(s![a, t, .., ..])
                    .assign(kernels[&key].matrix());
            }
        }
        Ok(transition)
    }
}

/// Size and seeding of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub n_days: usize,
    pub n_restarts: usize,
    /// Seed of the rollout RNG.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_days: 30,
            n_restarts: 1,
            seed: 123,
        }
    }
}

/// One simulated day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub day: usize,
    pub plan_index: usize,
    pub pragmatic: f64,
    pub epistemic: f64,
    /// Position indices at every boundary of the day.
    pub positions: Vec<usize>,
    /// Step level reached at the end of the day.
    pub final_steps: f64,
    /// Learning error after the day's transitions were absorbed.
    pub error: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestartReport {
    pub initial_error: f64,
    pub days: Vec<DayReport>,
    /// Learning error after every single transition.
    pub error_trace: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub restarts: Vec<RestartReport>,
}

impl SimulationReport {
    /// Learning error at the end of the run, averaged over restarts.
    pub fn mean_final_error(&self) -> Option<f64> {
        mean(self.restarts.iter().filter_map(|r| r.days.last().map(|d| d.error)))
    }

    /// End-of-day step level averaged over every simulated day.
    pub fn mean_final_steps(&self) -> Option<f64> {
        mean(
            self.restarts
                .iter()
                .flat_map(|r| r.days.iter().map(|d| d.final_steps)),
        )
    }

    /// How often each plan was selected.
    pub fn plan_counts(&self, n_plans: usize) -> Vec<usize> {
        let mut counts = vec![0; n_plans];
        for day in self.restarts.iter().flat_map(|r| &r.days) {
            if let Some(slot) = counts.get_mut(day.plan_index) {
                *slot += 1;
            }
        }
        counts
    }
}

/// Mean absolute difference between a transition tensor and normalised counts.
pub fn learning_error(truth: &Array4<f64>, counts: &PseudoCounts) -> Result<f64> {
    let estimate = normalize_last_axis(counts.alpha());
    if truth.dim() != estimate.dim() {
        return Err(Error::ShapeMismatch {
            context: "ground truth vs pseudo-counts".to_string(),
            expected: estimate.len(),
            got: truth.len(),
        });
    }
    let mut total = 0.0;
    Zip::from(truth).and(&estimate).for_each(|t, e| total += (t - e).abs());
    Ok(total / truth.len().max(1) as f64)
}

/// Run the assistant for `sim.n_days` days against the ground truth.
///
/// The plan of each day is chosen from midnight at the origin position, with
/// an RNG reseeded from `config.seed` as in production. Rollouts use one RNG
/// seeded from `sim.seed` for the whole run.
pub fn run_assistant_model(
    config: &AssistantConfig,
    truth: &Array4<f64>,
    plans: &[Vec<usize>],
    sim: &SimulationConfig,
    observer: &mut dyn SimulationObserver,
) -> Result<SimulationReport> {
    config.validate()?;
    let axis = config.position_axis()?;
    let params = config.efe_parameters();
    let init_pos_idx = axis.origin_index();
    let mut rng = StdRng::seed_from_u64(sim.seed);

    observer.on_run_start(sim.n_restarts, sim.n_days)?;
    let mut report = SimulationReport::default();
    for restart in 0..sim.n_restarts {
        observer.on_restart_start(restart)?;
        let mut counts = config.prior_counts()?;
        let mut restart_report = RestartReport {
            initial_error: learning_error(truth, &counts)?,
            ..RestartReport::default()
        };

        for day in 0..sim.n_days {
            let (plan_index, pragmatic, epistemic) = match config.heuristic {
                Some(index) if index >= plans.len() => {
                    return Err(Error::HeuristicOutOfRange {
                        index,
                        n_candidates: plans.len(),
                    });
                }
                Some(index) => (index, f64::NAN, f64::NAN),
                None => {
                    let mut selection_rng = StdRng::seed_from_u64(config.seed);
                    let selection = select_action_plan(
                        &counts,
                        init_pos_idx,
                        0,
                        &params,
                        plans,
                        &mut selection_rng,
                    )?;
                    (
                        selection.index,
                        selection.pragmatic[selection.index],
                        selection.epistemic[selection.index],
                    )
                }
            };
            let plan = &plans[plan_index];

            let mut pos_idx = init_pos_idx;
            let mut positions = Vec::with_capacity(plan.len() + 1);
            positions.push(pos_idx);
            for t_idx in 0..plan.len() {
                let (action, next) = make_a_step(t_idx, plan, pos_idx, truth, &mut rng)?;
                counts.update(action, t_idx, pos_idx, next)?;
                pos_idx = next;
                positions.push(pos_idx);
                restart_report.error_trace.push(learning_error(truth, &counts)?);
            }

            let day_report = DayReport {
                day,
                plan_index,
                pragmatic,
                epistemic,
                final_steps: axis.level(pos_idx).unwrap_or_default(),
                error: restart_report
                    .error_trace
                    .last()
                    .copied()
                    .unwrap_or(restart_report.initial_error),
                positions,
            };
            debug!(restart, day, plan_index, error = day_report.error, "simulated day");
            observer.on_day_end(restart, &day_report)?;
            restart_report.days.push(day_report);
        }
        report.restarts.push(restart_report);
    }
    observer.on_run_end()?;
    info!(
        n_restarts = sim.n_restarts,
        n_days = sim.n_days,
        final_error = report.mean_final_error(),
        "simulation finished"
    );
    Ok(report)
}

/// Average end-of-day step level of one fixed plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRun {
    pub plan_index: usize,
    pub mean_final_steps: f64,
}

/// Roll out every plan `n_restarts` times against the ground truth.
pub fn run_baseline(
    truth: &Array4<f64>,
    plans: &[Vec<usize>],
    axis: &PositionAxis,
    n_restarts: usize,
    seed: u64,
) -> Result<Vec<BaselineRun>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let init_pos_idx = axis.origin_index();
    plans
        .iter()
        .enumerate()
        .map(|(plan_index, plan)| {
            let mut total = 0.0;
            for _ in 0..n_restarts {
                let mut pos_idx = init_pos_idx;
                for t_idx in 0..plan.len() {
                    pos_idx = make_a_step(t_idx, plan, pos_idx, truth, &mut rng)?.1;
                }
                total += axis.level(pos_idx).unwrap_or_default();
            }
            Ok(BaselineRun {
                plan_index,
                mean_final_steps: total / n_restarts.max(1) as f64,
            })
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
