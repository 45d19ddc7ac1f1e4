//! Configuration of the scheduling assistant.

use std::{fs, path::Path};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    challenge::ChallengeLayout,
    efe::{EfeParameters, log_prior_position},
    position::PositionAxis,
    position_prior::PositionKernel,
    pseudo_counts::{JitterMask, PseudoCounts},
    timestep::Discretizer,
};

/// Gaussian-kernel prior used instead of flat jitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelPriorConfig {
    /// Expected step gain per timestep.
    pub drift: f64,
    pub sigma: f64,
    /// Weight of the kernel in pseudo-counts.
    pub concentration: f64,
    /// Forbid transitions to lower positions.
    #[serde(default)]
    pub monotone: bool,
}

/// Configuration of the assistant.
///
/// Every field has a default, so a JSON file only needs the values it
/// overrides.
///
/// # Examples
///
/// ```
/// use nudge::app::AssistantConfig;
///
/// let config = AssistantConfig::default()
///     .with_n_timestep(24)
///     .with_seed(7)
///     .with_gamma(0.5);
/// config.validate()?;
/// assert_eq!(config.log_prior().len(), config.n_position);
/// # Ok::<(), nudge::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub n_timestep: usize,
    pub n_position: usize,
    pub max_position: f64,
    pub n_action: usize,
    /// Initial pseudo-count per cell.
    pub jitter: f64,
    pub jitter_mask: JitterMask,
    /// Weight of the epistemic value.
    pub gamma: f64,
    /// Slope of the softmax position preference.
    pub prior_slope: f64,
    /// Seed of the per-invocation RNG.
    pub seed: u64,
    /// Fixed candidate index that bypasses the evaluation.
    pub heuristic: Option<usize>,
    /// Local timezone as seconds east of UTC.
    pub utc_offset_seconds: i32,
    pub discard_overlapping: bool,
    pub kernel_prior: Option<KernelPriorConfig>,
    pub layout: ChallengeLayout,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            n_timestep: 24,
            n_position: 10,
            max_position: 15_000.0,
            n_action: 2,
            jitter: 0.3,
            jitter_mask: JitterMask::Uniform,
            gamma: 1.0,
            prior_slope: 2.0,
            seed: 40,
            heuristic: None,
            utc_offset_seconds: 0,
            discard_overlapping: true,
            kernel_prior: None,
            layout: ChallengeLayout::default(),
        }
    }
}

impl AssistantConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config file {path:?}"),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_n_timestep(mut self, n_timestep: usize) -> Self {
        self.n_timestep = n_timestep;
        self
    }

    pub fn with_positions(mut self, n_position: usize, max_position: f64) -> Self {
        self.n_position = n_position;
        self.max_position = max_position;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_jitter_mask(mut self, mask: JitterMask) -> Self {
        self.jitter_mask = mask;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_prior_slope(mut self, slope: f64) -> Self {
        self.prior_slope = slope;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_heuristic(mut self, index: Option<usize>) -> Self {
        self.heuristic = index;
        self
    }

    pub fn with_utc_offset_seconds(mut self, seconds: i32) -> Self {
        self.utc_offset_seconds = seconds;
        self
    }

    pub fn with_discard_overlapping(mut self, discard: bool) -> Self {
        self.discard_overlapping = discard;
        self
    }

    pub fn with_kernel_prior(mut self, prior: Option<KernelPriorConfig>) -> Self {
        self.kernel_prior = prior;
        self
    }

    pub fn with_layout(mut self, layout: ChallengeLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Check every value that would otherwise fail deep inside a run.
    pub fn validate(&self) -> Result<()> {
        self.discretizer()?;
        self.position_axis()?;
        self.layout.validate()?;
        if self.n_action < 2 {
            return Err(Error::config(format!(
                "n_action must be at least 2, got {}",
                self.n_action
            )));
        }
        if !self.jitter.is_finite() || self.jitter <= 0.0 {
            return Err(Error::config(format!(
                "jitter must be positive and finite, got {}",
                self.jitter
            )));
        }
        if !self.gamma.is_finite() || !self.prior_slope.is_finite() {
            return Err(Error::config("gamma and prior_slope must be finite"));
        }
        if let Some(kernel) = &self.kernel_prior {
            if !kernel.concentration.is_finite() || kernel.concentration < 0.0 {
                return Err(Error::config(format!(
                    "kernel concentration must be non-negative, got {}",
                    kernel.concentration
                )));
            }
            self.kernel()?;
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_seconds).ok_or_else(|| {
            Error::config(format!(
                "invalid UTC offset of {} seconds",
                self.utc_offset_seconds
            ))
        })
    }

    pub fn discretizer(&self) -> Result<Discretizer> {
        Discretizer::new(self.n_timestep, self.timezone()?)
    }

    pub fn position_axis(&self) -> Result<PositionAxis> {
        PositionAxis::linear(self.n_position, self.max_position)
    }

    pub fn log_prior(&self) -> Vec<f64> {
        log_prior_position(self.n_position, self.prior_slope)
    }

    pub fn efe_parameters(&self) -> EfeParameters {
        EfeParameters::new(self.log_prior(), self.gamma)
    }

    fn kernel(&self) -> Result<Option<PositionKernel>> {
        let Some(prior) = &self.kernel_prior else {
            return Ok(None);
        };
        let kernel = PositionKernel::gaussian(&self.position_axis()?, prior.drift, prior.sigma)?;
        Ok(Some(if prior.monotone {
            kernel.monotone()
        } else {
            kernel
        }))
    }

    /// Pseudo-counts before any observation.
    pub fn prior_counts(&self) -> Result<PseudoCounts> {
        match (self.kernel()?, &self.kernel_prior) {
            (Some(kernel), Some(prior)) => kernel.to_pseudo_counts(
                self.n_action,
                self.n_timestep,
                prior.concentration,
                self.jitter,
                self.jitter_mask,
            ),
            _ => PseudoCounts::initialize(
                self.n_action,
                self.n_timestep,
                self.n_position,
                self.jitter,
                self.jitter_mask,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AssistantConfig::default();
        config.validate().unwrap();
        assert_eq!(config.position_axis().unwrap().levels()[9], 15_000.0);
        assert_eq!(config.prior_counts().unwrap().alpha().dim(), (2, 24, 10, 10));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"n_timestep": 48, "seed": 3, "heuristic": 1}}"#).unwrap();
        let config = AssistantConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.n_timestep, 48);
        assert_eq!(config.seed, 3);
        assert_eq!(config.heuristic, Some(1));
        assert_eq!(config.n_position, 10);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(AssistantConfig::default().with_jitter(0.0).validate().is_err());
        assert!(AssistantConfig::default().with_n_timestep(0).validate().is_err());
        assert!(
            AssistantConfig::default()
                .with_utc_offset_seconds(90_000)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn kernel_prior_shapes_initial_counts() {
        let config = AssistantConfig::default().with_kernel_prior(Some(KernelPriorConfig {
            drift: 500.0,
            sigma: 1500.0,
            concentration: 5.0,
            monotone: true,
        }));
        config.validate().unwrap();
        let counts = config.prior_counts().unwrap();
        assert!((counts.get(0, 0, 3, 2) - config.jitter).abs() < 1e-12);
        assert!(counts.get(0, 0, 3, 3) > config.jitter);
    }
}
