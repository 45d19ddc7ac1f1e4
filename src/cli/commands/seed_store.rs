//! Seed-store command - Create or extend a store file for one user

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;
use tracing::info;

use crate::{
    activity::StepRecord,
    adapters::{MsgPackStore, StoreSnapshot},
    cli::{config::ConfigArgs, output::print_kv},
};

#[derive(Parser, Debug)]
#[command(about = "Add a user and their daily challenges to a store file")]
pub struct SeedStoreArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// MessagePack store file, created when missing
    #[arg(long, short = 's')]
    pub store: PathBuf,

    /// User to seed
    #[arg(long, short = 'u')]
    pub user: String,

    /// First day with challenges (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Number of consecutive days with challenges
    #[arg(long, short = 'd', default_value_t = 7)]
    pub days: usize,

    /// Also add hourly step records for this many days before `start`,
    /// growing linearly to the given daily total
    #[arg(long, default_value_t = 0)]
    pub history_days: usize,

    /// Daily step total of the generated history
    #[arg(long, default_value_t = 7000)]
    pub daily_steps: u32,
}

pub fn execute(args: SeedStoreArgs) -> Result<()> {
    let config = args.config.load()?;
    let discretizer = config.discretizer()?;
    let store = MsgPackStore::new(&args.store);
    let mut snapshot = if args.store.exists() {
        store.load()?
    } else {
        StoreSnapshot::default()
    };

    let mut challenges = Vec::new();
    for offset in 0..args.days {
        let date = args.start + Duration::days(offset as i64);
        challenges.extend(config.layout.challenges_on(date, &discretizer)?);
    }

    let mut records = Vec::new();
    for offset in 1..=args.history_days {
        let date = args.start - Duration::days(offset as i64);
        let midnight = discretizer.start_of_day(date);
        for hour in 1..=24u32 {
            let steps = u64::from(args.daily_steps) * u64::from(hour) / 24;
            let steps = u32::try_from(steps).context("step count overflow")?;
            records.push(StepRecord::new(
                midnight + Duration::hours(i64::from(hour)) - Duration::seconds(1),
                steps,
            ));
        }
    }

    let n_challenges = challenges.len();
    let n_records = records.len();
    let user = snapshot.ensure_user(&args.user);
    user.challenges.extend(challenges);
    user.step_records.extend(records);
    store.save(&snapshot)?;

    info!(user = %args.user, n_challenges, n_records, "store seeded");
    print_kv("store", &args.store.display().to_string());
    print_kv("user", &args.user);
    print_kv("challenges added", &n_challenges.to_string());
    print_kv("step records added", &n_records.to_string());
    Ok(())
}
