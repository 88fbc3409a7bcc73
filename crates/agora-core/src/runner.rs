//! Bounded simulation loop.
//!
//! [`run_simulation`] wraps the single-tick [`run_tick`] and forwards each
//! summary to the telemetry sink.
//!
//! [`run_tick`]: crate::tick::run_tick

use tracing::info;

use crate::protocol::Protocols;
use crate::telemetry::TelemetrySink;
use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Number of ticks executed.
    pub total_ticks: u64,
    /// Number of trades executed across all ticks.
    pub total_trades: u64,
    /// The last tick summary, if any tick ran.
    pub final_summary: Option<TickSummary>,
}

/// Run `max_ticks` ticks.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails; ticks already run stay applied
/// to `state`.
pub fn run_simulation(
    state: &mut SimulationState,
    protocols: &Protocols,
    sink: &mut dyn TelemetrySink,
    max_ticks: u64,
) -> Result<SimulationResult, RunnerError> {
    info!(
        max_ticks,
        agents = state.agents.len(),
        resources = state.grid.resource_count(),
        "Simulation starting"
    );

    let mut total_ticks: u64 = 0;
    let mut total_trades: u64 = 0;
    let mut final_summary = None;

    while total_ticks < max_ticks {
        let summary = tick::run_tick(state, protocols, sink)?;
        total_ticks = total_ticks.saturating_add(1);
        let trades = u64::try_from(summary.trades.len()).unwrap_or(u64::MAX);
        total_trades = total_trades.saturating_add(trades);
        sink.on_tick(&summary);
        final_summary = Some(summary);
    }

    let result = SimulationResult {
        total_ticks,
        total_trades,
        final_summary,
    };
    log_simulation_end(&result);
    Ok(result)
}

/// Log the end-of-run totals.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        total_ticks = result.total_ticks,
        total_trades = result.total_trades,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        final_active_pairs = result.final_summary.as_ref().map(|s| s.active_pairs),
        "Simulation ended"
    );
}
