//! Arguments shared by every command that builds an assistant.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::Args;

use crate::{
    action_plan::{ActionPlanGenerator, ActionPlan, ChallengeWindow},
    app::AssistantConfig,
    challenge::ChallengeLayout,
};

/// Configuration file plus the overrides most often changed from the shell.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// JSON configuration file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Random seed of the plan selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of timesteps per day
    #[arg(long)]
    pub n_timestep: Option<usize>,

    /// Epistemic weight
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Always pick this candidate index instead of evaluating plans
    #[arg(long)]
    pub heuristic: Option<usize>,

    /// Local timezone as seconds east of UTC
    #[arg(long, allow_negative_numbers = true)]
    pub utc_offset: Option<i32>,

    /// First offer of the day (HH:MM)
    #[arg(long)]
    pub first_offer: Option<String>,

    /// Challenges per day
    #[arg(long)]
    pub challenges_per_day: Option<usize>,
}

impl ConfigArgs {
    /// File or default configuration with the command-line overrides applied.
    pub fn load(&self) -> Result<AssistantConfig> {
        let mut config = match &self.config {
            Some(path) => AssistantConfig::from_json_file(path)
                .with_context(|| format!("failed to load configuration from {path:?}"))?,
            None => AssistantConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(n_timestep) = self.n_timestep {
            config.n_timestep = n_timestep;
        }
        if let Some(gamma) = self.gamma {
            config.gamma = gamma;
        }
        if self.heuristic.is_some() {
            config.heuristic = self.heuristic;
        }
        if let Some(offset) = self.utc_offset {
            config.utc_offset_seconds = offset;
        }
        if let Some(first_offer) = &self.first_offer {
            config.layout.first_offer = NaiveTime::parse_from_str(first_offer, "%H:%M")
                .with_context(|| format!("invalid --first-offer '{first_offer}' (expected HH:MM)"))?;
        }
        if let Some(n) = self.challenges_per_day {
            config.layout.challenges_per_day = n;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Whole-day candidate plans of the configured layout.
pub fn layout_plans(config: &AssistantConfig) -> Result<(Vec<ChallengeWindow>, Vec<ActionPlan>)> {
    let discretizer = config.discretizer()?;
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid reference date")?;
    let windows = layout_windows(&config.layout, date, config)?;
    let plans = ActionPlanGenerator::new(discretizer.n_timestep())
        .with_discard_overlapping(config.discard_overlapping)
        .generate(&windows)?;
    Ok((windows, plans))
}

fn layout_windows(
    layout: &ChallengeLayout,
    date: NaiveDate,
    config: &AssistantConfig,
) -> Result<Vec<ChallengeWindow>> {
    let discretizer = config.discretizer()?;
    let windows = layout
        .challenges_on(date, &discretizer)?
        .iter()
        .map(|c| c.window(&discretizer))
        .collect::<crate::Result<Vec<_>>>()?;
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let args = ConfigArgs {
            seed: Some(9),
            heuristic: Some(0),
            first_offer: Some("06:30".to_string()),
            ..ConfigArgs::default()
        };
        let config = args.load().unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.heuristic, Some(0));
        assert_eq!(
            config.layout.first_offer,
            NaiveTime::from_hms_opt(6, 30, 0).unwrap()
        );
    }

    #[test]
    fn bad_offer_time_is_rejected() {
        let args = ConfigArgs {
            first_offer: Some("7am".to_string()),
            ..ConfigArgs::default()
        };
        assert!(args.load().is_err());
    }

    #[test]
    fn default_layout_yields_two_plans() {
        let (windows, plans) = layout_plans(&AssistantConfig::default()).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.len() == 24));
    }
}
