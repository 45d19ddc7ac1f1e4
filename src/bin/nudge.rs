//! nudge CLI - Active-inference scheduling of walking challenges
//!
//! This CLI provides a unified interface for:
//! - Listing the candidate plans of a challenge layout
//! - Simulating the assistant against a synthetic user
//! - Seeding a store file and scheduling a user's day against it

use anyhow::Result;
use clap::{Parser, Subcommand};
use nudge::cli::commands::{plans, schedule, seed_store, simulate};

#[derive(Parser)]
#[command(name = "nudge")]
#[command(version, about = "Active-inference scheduling of walking challenges", long_about = None)]
struct Cli {
    /// Log filter when RUST_LOG is not set (e.g. info, nudge=debug)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List candidate plans for a challenge layout
    Plans(plans::PlansArgs),

    /// Simulate the assistant against a synthetic user
    Simulate(Box<simulate::SimulateArgs>),

    /// Schedule today's challenges for one user
    Schedule(schedule::ScheduleArgs),

    /// Add a user and their daily challenges to a store file
    SeedStore(seed_store::SeedStoreArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    nudge::logging::init_tracing(&cli.log_level);

    match cli.command {
        Commands::Plans(args) => plans::execute(args),
        Commands::Simulate(args) => simulate::execute(*args),
        Commands::Schedule(args) => schedule::execute(args),
        Commands::SeedStore(args) => seed_store::execute(args),
    }
}
