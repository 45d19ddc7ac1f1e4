//! Plans command - List the candidate plans of a challenge layout

use anyhow::Result;
use clap::Parser;

use crate::cli::{
    config::{ConfigArgs, layout_plans},
    output::{format_plan, print_kv, print_section},
};

#[derive(Parser, Debug)]
#[command(about = "List candidate plans for the configured challenge layout")]
pub struct PlansArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the plans as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn execute(args: PlansArgs) -> Result<()> {
    let config = args.config.load()?;
    let (windows, plans) = layout_plans(&config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    print_section("Challenge windows");
    for (i, window) in windows.iter().enumerate() {
        print_kv(
            &format!("challenge {i}"),
            &format!(
                "offer t={}, window [{}, {}), duration {}",
                window.offer_begin, window.earliest, window.latest, window.duration
            ),
        );
    }

    print_section(&format!("{} candidate plans", plans.len()));
    for (i, plan) in plans.iter().enumerate() {
        println!("  {i:>4}  {}", format_plan(plan));
    }
    Ok(())
}
