//! Schedule command - Run one belief update against a store file

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local};
use clap::Parser;

use crate::{
    app::App,
    assistant::ScheduleOutcome,
    cli::{
        config::ConfigArgs,
        output::{format_plan, print_kv, print_section},
    },
};

#[derive(Parser, Debug)]
#[command(about = "Schedule today's challenges for one user")]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// MessagePack store file
    #[arg(long, short = 's')]
    pub store: PathBuf,

    /// User to schedule
    #[arg(long, short = 'u')]
    pub user: String,

    /// Invocation time (RFC 3339), defaults to now
    #[arg(long)]
    pub at: Option<DateTime<FixedOffset>>,

    /// Print the outcome as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn execute(args: ScheduleArgs) -> Result<()> {
    let config = args.config.load()?;
    let app = App::with_store_file(&args.store, config);
    let assistant = app.assistant()?;
    let now = args.at.unwrap_or_else(|| Local::now().fixed_offset());

    let outcome = assistant.update_beliefs(&args.user, &now)?;
    match outcome {
        ScheduleOutcome::Idle(reason) => {
            if args.json {
                println!("{}", serde_json::json!({ "idle": reason }));
            } else {
                print_kv("outcome", &format!("idle ({reason:?})"));
            }
        }
        ScheduleOutcome::Scheduled { decision, updates } => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(
                        &serde_json::json!({ "decision": decision, "updates": updates })
                    )?
                );
                return Ok(());
            }
            print_section(&format!("Schedule for {} on {}", decision.user, decision.date));
            print_kv("plan", &format_plan(&decision.action_plan));
            print_kv(
                "candidate",
                &format!("{} of {}", decision.selected_index, decision.n_candidates),
            );
            print_kv("source", &format!("{:?}", decision.source));
            print_kv("observations", &decision.n_observations.to_string());
            for update in &updates {
                print_kv(
                    &update.id.to_string()[..8],
                    &format!("{} -> {}", update.begin, update.end),
                );
            }
        }
    }
    Ok(())
}
