//! Output formatting and progress bars for CLI

use indicatif::{ProgressBar, ProgressStyle};

use crate::{ports::SimulationObserver, simulation::DayReport};

/// Progress bar over every simulated day of a run.
pub fn create_simulation_progress(total_days: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_days);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} days ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb
}

/// Simulation observer driving a progress bar.
pub struct ProgressObserver {
    bar: Option<ProgressBar>,
    enabled: bool,
}

impl ProgressObserver {
    pub fn new(enabled: bool) -> Self {
        Self { bar: None, enabled }
    }
}

impl SimulationObserver for ProgressObserver {
    fn on_run_start(&mut self, n_restarts: usize, n_days: usize) -> crate::Result<()> {
        if self.enabled {
            self.bar = Some(create_simulation_progress((n_restarts * n_days) as u64));
        }
        Ok(())
    }

    fn on_day_end(&mut self, restart: usize, report: &DayReport) -> crate::Result<()> {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("restart {restart}, error {:.4}", report.error));
            bar.inc(1);
        }
        Ok(())
    }

    fn on_run_end(&mut self) -> crate::Result<()> {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message("done");
        }
        Ok(())
    }
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Render a plan as a string of 0/1 digits.
pub fn format_plan(plan: &[usize]) -> String {
    plan.iter().map(|a| char::from(b'0' + (*a).min(9) as u8)).collect()
}

/// Format a float, or `-` when it is not finite.
pub fn format_value(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.4}")
    } else {
        "-".to_string()
    }
}
