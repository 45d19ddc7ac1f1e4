//! Dirichlet pseudo-counts over position transitions.
//!
//! The tensor `alpha[action][timestep][position][next_position]` is the
//! sufficient statistic of the learned movement model. Every observed
//! transition adds exactly one count; row normalisation of the last axis yields
//! the expected transition probabilities `Q(p' | p, a, t)`.

use ndarray::{Array4, Axis};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where the initial jitter (Dirichlet prior strength) is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterMask {
    /// Every cell starts at `jitter`.
    #[default]
    Uniform,
    /// Only cells with `next_position >= position` start at `jitter`; the
    /// others start at zero because step counts cannot decrease within a day.
    UpperTriangular,
}

impl JitterMask {
    fn applies(self, position: usize, next_position: usize) -> bool {
        match self {
            JitterMask::Uniform => true,
            JitterMask::UpperTriangular => next_position >= position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PseudoCounts {
    alpha: Array4<f64>,
    n_observations: usize,
}

impl PseudoCounts {
    /// Jitter-only prior of shape `(n_action, n_timestep, n_position, n_position)`.
    pub fn initialize(
        n_action: usize,
        n_timestep: usize,
        n_position: usize,
        jitter: f64,
        mask: JitterMask,
    ) -> Result<Self> {
        if n_action == 0 || n_timestep == 0 || n_position == 0 {
            return Err(Error::config(format!(
                "pseudo-count dimensions must be positive, got ({n_action}, {n_timestep}, {n_position}, {n_position})"
            )));
        }
        if !jitter.is_finite() || jitter <= 0.0 {
            return Err(Error::config(format!(
                "pseudo-count jitter must be positive and finite, got {jitter}"
            )));
        }
        let alpha = Array4::from_shape_fn(
            (n_action, n_timestep, n_position, n_position),
            |(_, _, p, p_next)| {
                if mask.applies(p, p_next) {
                    jitter
                } else {
                    0.0
                }
            },
        );
        Ok(Self {
            alpha,
            n_observations: 0,
        })
    }

    /// Wrap an explicit prior tensor. Cells must be finite and non-negative and
    /// the last two axes must be square.
    pub fn from_prior(alpha: Array4<f64>) -> Result<Self> {
        let (_, _, n_position, n_next) = alpha.dim();
        if n_position != n_next {
            return Err(Error::ShapeMismatch {
                context: "pseudo-count transition axes".to_string(),
                expected: n_position,
                got: n_next,
            });
        }
        if alpha.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::config(
                "pseudo-counts must be finite and non-negative",
            ));
        }
        Ok(Self {
            alpha,
            n_observations: 0,
        })
    }

    /// Add every transition of the given days to the current counts.
    ///
    /// `actions[d][t]` is the action taken during timestep `t` of day `d` and
    /// `positions[d][k]` the position index at the boundary starting timestep
    /// `k` (so each day has `n_timestep + 1` boundaries). Days may be partial:
    /// only transitions whose end boundary is present are counted.
    pub fn absorb(&mut self, actions: &[Vec<usize>], positions: &[Vec<usize>]) -> Result<()> {
        if actions.len() != positions.len() {
            return Err(Error::ShapeMismatch {
                context: "observed days (actions vs positions)".to_string(),
                expected: actions.len(),
                got: positions.len(),
            });
        }
        let n_timestep = self.n_timestep();
        for (day_actions, day_positions) in actions.iter().zip(positions) {
            if day_actions.len() != n_timestep {
                return Err(Error::ShapeMismatch {
                    context: "actions per day".to_string(),
                    expected: n_timestep,
                    got: day_actions.len(),
                });
            }
            for (t, pair) in day_positions.windows(2).take(n_timestep).enumerate() {
                self.update(day_actions[t], t, pair[0], pair[1])?;
            }
        }
        Ok(())
    }

    pub fn n_action(&self) -> usize {
        self.alpha.dim().0
    }

    pub fn n_timestep(&self) -> usize {
        self.alpha.dim().1
    }

    pub fn n_position(&self) -> usize {
        self.alpha.dim().2
    }

    /// Raw concentration parameters.
    pub fn alpha(&self) -> &Array4<f64> {
        &self.alpha
    }

    /// Count stored for one transition cell.
    pub fn get(&self, action: usize, t: usize, position: usize, next_position: usize) -> f64 {
        self.alpha[[action, t, position, next_position]]
    }

    /// Record one observed transition: exactly one cell grows by 1.
    pub fn update(
        &mut self,
        action: usize,
        t: usize,
        position: usize,
        next_position: usize,
    ) -> Result<()> {
        let (n_action, n_timestep, n_position, _) = self.alpha.dim();
        if action >= n_action {
            return Err(Error::ActionOutOfRange { action, n_action });
        }
        if t >= n_timestep {
            return Err(Error::TimestepOutOfRange {
                timestep: t,
                n_timestep,
            });
        }
        for p in [position, next_position] {
            if p >= n_position {
                return Err(Error::PositionOutOfRange {
                    position: p,
                    n_position,
                });
            }
        }
        self.alpha[[action, t, position, next_position]] += 1.0;
        self.n_observations += 1;
        Ok(())
    }

    /// Expected transition probabilities (row-normalised last axis).
    pub fn expected_transition(&self) -> Array4<f64> {
        normalize_last_axis(&self.alpha)
    }

    /// Number of transitions absorbed since the prior was set.
    pub fn observation_count(&self) -> usize {
        self.n_observations
    }
}

/// Normalise every row along the last axis to sum to one. Rows whose sum is
/// not positive are divided by 1 instead.
pub fn normalize_last_axis(alpha: &Array4<f64>) -> Array4<f64> {
    let mut normalized = alpha.clone();
    for mut row in normalized.lanes_mut(Axis(3)) {
        let sum = row.sum();
        let divisor = if sum > 0.0 { sum } else { 1.0 };
        row.mapv_inplace(|v| v / divisor);
    }
    normalized
}
