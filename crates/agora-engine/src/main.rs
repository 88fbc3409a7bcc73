//! Command-line runner for the Agora exchange simulation.
//!
//! # Startup Sequence
//!
//! 1. Resolve the scenario file: the first argument, else `AGORA_SCENARIO`,
//!    else `agora-scenario.yaml` in the working directory, else defaults
//! 2. Load and validate the scenario
//! 3. Initialize structured logging (`RUST_LOG` overrides the configured
//!    level)
//! 4. Build the initial state from the scenario seed
//! 5. Run the configured number of ticks, writing JSON-lines telemetry
//!    when a path is configured
//! 6. Log the result

mod error;
mod telemetry;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use agora_core::config::LoggingConfig;
use agora_core::runner::{self, SimulationResult};
use agora_core::{NoOpSink, Protocols, ScenarioConfig, SimulationState};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::telemetry::JsonLinesSink;

/// Default scenario file looked up in the working directory.
const DEFAULT_SCENARIO: &str = "agora-scenario.yaml";

/// Environment variable naming the scenario file.
const SCENARIO_ENV: &str = "AGORA_SCENARIO";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1-2. Load configuration.
    let path = scenario_path();
    let config = match &path {
        Some(path) => ScenarioConfig::from_file(path).map_err(EngineError::from)?,
        None => ScenarioConfig::default(),
    };

    // 3. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("agora-engine starting");
    match &path {
        Some(path) => info!(path = %path.display(), "Scenario file loaded"),
        None => info!("Scenario file not found, using defaults"),
    }
    info!(
        scenario = %config.scenario.name,
        seed = config.scenario.seed,
        ticks = config.scenario.ticks,
        regime = ?config.params.exchange_regime,
        "Configuration loaded"
    );

    // 4. Build the initial state.
    let mut state = agora_core::build_state(&config).map_err(EngineError::from)?;

    // 5. Run.
    let protocols = Protocols::default();
    let result = match &config.telemetry.jsonl_path {
        Some(out) => run_with_telemetry(&mut state, &protocols, config.scenario.ticks, out)?,
        None => runner::run_simulation(&mut state, &protocols, &mut NoOpSink, config.scenario.ticks)
            .map_err(EngineError::from)?,
    };

    // 6. Log the result.
    info!(
        total_ticks = result.total_ticks,
        total_trades = result.total_trades,
        agents = state.agents.len(),
        "agora-engine finished"
    );
    Ok(())
}

/// The scenario file to load, if any.
fn scenario_path() -> Option<PathBuf> {
    if let Some(arg) = std::env::args_os().nth(1) {
        return Some(PathBuf::from(arg));
    }
    if let Some(var) = std::env::var_os(SCENARIO_ENV) {
        return Some(PathBuf::from(var));
    }
    let default = PathBuf::from(DEFAULT_SCENARIO);
    default.exists().then_some(default)
}

fn init_logging(config: &LoggingConfig) -> Result<(), EngineError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|err| EngineError::Logging {
            message: err.to_string(),
        })?,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn run_with_telemetry(
    state: &mut SimulationState,
    protocols: &Protocols,
    ticks: u64,
    out: &str,
) -> Result<SimulationResult, EngineError> {
    let file = File::create(out)?;
    let mut sink = JsonLinesSink::new(BufWriter::new(file));
    let result = runner::run_simulation(state, protocols, &mut sink, ticks)?;
    let (_, lines) = sink.finish()?;
    info!(path = out, lines, "Telemetry written");
    Ok(result)
}
