//! Observer port for simulation runs.
//!
//! The simulation harness reports its progress through this trait so that
//! progress bars, summaries or custom collectors can be attached without the
//! harness knowing about them.

use crate::{Result, simulation::DayReport};

/// Observer of a simulation run.
///
/// Callbacks arrive in this order:
/// 1. `on_run_start(n_restarts, n_days)` once
/// 2. per restart: `on_restart_start(restart)`, then `on_day_end(restart, report)`
///    for every simulated day
/// 3. `on_run_end()` once
///
/// Every method defaults to doing nothing.
///
/// # Examples
///
/// ```
/// use nudge::{ports::SimulationObserver, simulation::DayReport};
///
/// #[derive(Default)]
/// struct ErrorTrace(Vec<f64>);
///
/// impl SimulationObserver for ErrorTrace {
///     fn on_day_end(&mut self, _restart: usize, report: &DayReport) -> nudge::Result<()> {
///         self.0.push(report.error);
///         Ok(())
///     }
/// }
/// ```
pub trait SimulationObserver: Send {
    fn on_run_start(&mut self, _n_restarts: usize, _n_days: usize) -> Result<()> {
        Ok(())
    }

    fn on_restart_start(&mut self, _restart: usize) -> Result<()> {
        Ok(())
    }

    /// Called after the day's transitions were absorbed.
    fn on_day_end(&mut self, _restart: usize, _report: &DayReport) -> Result<()> {
        Ok(())
    }

    fn on_run_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SimulationObserver for NullObserver {}
