//! Smooth Gaussian-kernel position transitions.
//!
//! A kernel row `p` spreads the next position around `level(p) + drift` with a
//! normal density. It can seed the pseudo-counts with a shaped prior instead of
//! flat jitter, and it is the building block of the synthetic users driven by
//! the simulation harness.

use ndarray::{Array2, Array4, Axis};
use statrs::distribution::{Continuous, Normal};

use crate::{
    Error, Result,
    position::PositionAxis,
    pseudo_counts::{JitterMask, PseudoCounts},
};

/// Row-stochastic matrix `K[p][p']` over the position axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionKernel {
    matrix: Array2<f64>,
}

impl PositionKernel {
    /// Gaussian kernel centred on `level(p) + drift` with standard deviation `sigma`.
    ///
    /// When the density underflows on every level the whole mass goes to the
    /// nearest bound of the axis; underflow strictly inside the axis means
    /// `sigma` is too small for the level spacing.
    pub fn gaussian(axis: &PositionAxis, drift: f64, sigma: f64) -> Result<Self> {
        if !drift.is_finite() {
            return Err(Error::config(format!("kernel drift must be finite, got {drift}")));
        }
        let levels = axis.levels();
        let n = levels.len();
        let first = levels[0];
        let last = levels[n - 1];
        let mut matrix = Array2::<f64>::zeros((n, n));

        for (p, &level) in levels.iter().enumerate() {
            let loc = level + drift;
            let normal = Normal::new(loc, sigma).map_err(|e| {
                Error::config(format!("invalid kernel (loc {loc}, sigma {sigma}): {e}"))
            })?;
            let mut row = matrix.row_mut(p);
            for (q, &target) in levels.iter().enumerate() {
                row[q] = normal.pdf(target);
            }
            let sum = row.sum();
            if sum > 0.0 {
                row.mapv_inplace(|v| v / sum);
            } else if loc < first {
                row[0] = 1.0;
            } else if loc > last {
                row[n - 1] = 1.0;
            } else {
                return Err(Error::config(format!(
                    "kernel density vanished at {loc} inside [{first}, {last}]; increase sigma"
                )));
            }
        }
        Ok(Self { matrix })
    }

    /// Restrict every row to `p' >= p` and renormalise; a row left empty keeps
    /// all its mass on `p' = p`.
    pub fn monotone(mut self) -> Self {
        for (p, mut row) in self.matrix.axis_iter_mut(Axis(0)).enumerate() {
            for q in 0..p {
                row[q] = 0.0;
            }
            let sum = row.sum();
            if sum > 0.0 {
                row.mapv_inplace(|v| v / sum);
            } else {
                row[p] = 1.0;
            }
        }
        self
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn n_position(&self) -> usize {
        self.matrix.nrows()
    }

    /// Pseudo-counts `jitter (masked) + concentration · K` replicated over every
    /// action and timestep.
    pub fn to_pseudo_counts(
        &self,
        n_action: usize,
        n_timestep: usize,
        concentration: f64,
        jitter: f64,
        mask: JitterMask,
    ) -> Result<PseudoCounts> {
        if !concentration.is_finite() || concentration < 0.0 {
            return Err(Error::config(format!(
                "kernel concentration must be finite and non-negative, got {concentration}"
            )));
        }
        let base = PseudoCounts::initialize(n_action, n_timestep, self.n_position(), jitter, mask)?;
        let mut alpha: Array4<f64> = base.alpha().clone();
        for mut slice in alpha.outer_iter_mut() {
            for mut matrix in slice.outer_iter_mut() {
                matrix.scaled_add(concentration, &self.matrix);
            }
        }
        PseudoCounts::from_prior(alpha)
    }
}
