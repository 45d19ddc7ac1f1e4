//! Discretised step-count levels ("positions").

use serde::{Deserialize, Serialize};

use crate::{Error, Result, utils};

/// Ordered step-count levels spanning `[0, max_position]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionAxis {
    levels: Vec<f64>,
}

impl PositionAxis {
    /// `n_position` evenly spaced levels from 0 to `max_position` inclusive.
    pub fn linear(n_position: usize, max_position: f64) -> Result<Self> {
        if n_position == 0 {
            return Err(Error::config("n_position must be at least 1"));
        }
        if !max_position.is_finite() || max_position < 0.0 {
            return Err(Error::config(format!(
                "max_position must be finite and non-negative, got {max_position}"
            )));
        }
        Ok(Self {
            levels: utils::linspace(0.0, max_position, n_position),
        })
    }

    /// Axis from explicit levels, which must be finite and strictly increasing.
    pub fn from_levels(levels: Vec<f64>) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::config("position axis needs at least one level"));
        }
        if levels.iter().any(|l| !l.is_finite()) || levels.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::config(
                "position levels must be finite and strictly increasing",
            ));
        }
        Ok(Self { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn level(&self, idx: usize) -> Option<f64> {
        self.levels.get(idx).copied()
    }

    /// Level closest to the step count (ties go to the lower level).
    pub fn nearest_index(&self, steps: f64) -> usize {
        utils::nearest_index(&self.levels, steps)
    }

    /// Index of the bin containing `steps`: the last level `<= steps`,
    /// clamped to the axis.
    pub fn containing_index(&self, steps: f64) -> usize {
        self.levels
            .iter()
            .rposition(|&level| level <= steps)
            .unwrap_or(0)
    }

    /// Index of the level closest to zero steps.
    pub fn origin_index(&self) -> usize {
        self.nearest_index(0.0)
    }
}
