//! Simulate command - Run the assistant against a synthetic user

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    cli::{
        config::{ConfigArgs, layout_plans},
        output::{ProgressObserver, format_plan, format_value, print_kv, print_section},
    },
    simulation::{
        BaselineRun, SimulationConfig, SimulationReport, SyntheticUser, run_assistant_model,
        run_baseline,
    },
};

#[derive(Parser, Debug)]
#[command(about = "Simulate the assistant against a synthetic user")]
pub struct SimulateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Simulated days per restart
    #[arg(long, short = 'd', default_value_t = 30)]
    pub days: usize,

    /// Independent restarts with fresh beliefs
    #[arg(long, short = 'r', default_value_t = 1)]
    pub restarts: usize,

    /// Seed of the synthetic user's rollouts
    #[arg(long, default_value_t = 123)]
    pub run_seed: u64,

    /// Steps the synthetic user walks per day without nudges
    #[arg(long, default_value_t = 7000.0)]
    pub daily_steps: f64,

    /// Extra steps per timestep while a challenge is active
    #[arg(long, default_value_t = 1500.0)]
    pub nudge_steps: f64,

    /// Spread of the step gain per timestep
    #[arg(long, default_value_t = 1000.0)]
    pub sigma: f64,

    /// Rollouts per plan for the fixed-plan baseline (0 skips it)
    #[arg(long, default_value_t = 100)]
    pub baseline_restarts: usize,

    /// Write the full report as JSON
    #[arg(long, short = 'O')]
    pub output: Option<PathBuf>,

    /// Show progress bar
    #[arg(long, default_value_t = true)]
    pub progress: bool,
}

#[derive(Debug, Serialize)]
struct SimulationFile<'a> {
    user: &'a SyntheticUser,
    plans: &'a [Vec<usize>],
    report: &'a SimulationReport,
    baseline: &'a [BaselineRun],
}

pub fn execute(args: SimulateArgs) -> Result<()> {
    let config = args.config.load()?;
    let (_, plans) = layout_plans(&config)?;
    let axis = config.position_axis()?;
    let user = SyntheticUser {
        daily_steps: args.daily_steps,
        nudge_steps: args.nudge_steps,
        sigma: args.sigma,
        ..SyntheticUser::default()
    };
    let truth = user.transition(&axis, config.n_action, config.n_timestep)?;
    let sim = SimulationConfig {
        n_days: args.days,
        n_restarts: args.restarts,
        seed: args.run_seed,
    };

    let mut observer = ProgressObserver::new(args.progress);
    let report = run_assistant_model(&config, &truth, &plans, &sim, &mut observer)?;
    let baseline = if args.baseline_restarts > 0 {
        run_baseline(&truth, &plans, &axis, args.baseline_restarts, args.run_seed)?
    } else {
        Vec::new()
    };

    print_section("Assistant");
    print_kv("candidate plans", &plans.len().to_string());
    let initial = report
        .restarts
        .first()
        .map_or(f64::NAN, |r| r.initial_error);
    print_kv("initial error", &format_value(initial));
    print_kv(
        "final error",
        &format_value(report.mean_final_error().unwrap_or(f64::NAN)),
    );
    print_kv(
        "mean daily steps",
        &format_value(report.mean_final_steps().unwrap_or(f64::NAN)),
    );
    for (i, count) in report.plan_counts(plans.len()).iter().enumerate() {
        if *count > 0 {
            print_kv(&format!("plan {i}"), &format!("{} ({count} days)", format_plan(&plans[i])));
        }
    }

    if !baseline.is_empty() {
        print_section("Fixed-plan baseline");
        for run in &baseline {
            print_kv(
                &format!("plan {}", run.plan_index),
                &format_value(run.mean_final_steps),
            );
        }
    }

    if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("failed to create {path:?}"))?;
        to_writer_pretty(
            file,
            &SimulationFile {
                user: &user,
                plans: &plans,
                report: &report,
                baseline: &baseline,
            },
        )?;
        print_kv("report", &path.display().to_string());
    }
    Ok(())
}
