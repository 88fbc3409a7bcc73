//! Scenario configuration loading and typed config structures.
//!
//! A scenario lives in a YAML file (by default `agora-scenario.yaml`). This
//! module defines strongly-typed structs that mirror the YAML structure,
//! and provides a loader that reads and validates the file. Every section
//! and field has a default, so an empty document is a valid scenario.

use std::path::Path;

use agora_agents::{QuoteParams, UtilityForm};
use agora_types::{ExchangeRegime, Good, Inventory, Position};
use serde::Deserialize;

use crate::clock::ModeSchedule;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level scenario configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    /// Name, seed and run length.
    #[serde(default)]
    pub scenario: ScenarioSection,

    /// Grid dimensions.
    #[serde(default)]
    pub grid: GridConfig,

    /// Search, matching and bargaining parameters.
    #[serde(default)]
    pub params: ScenarioParams,

    /// Optional forage/trade alternation. Absent means both every tick.
    #[serde(default)]
    pub schedule: Option<ModeSchedule>,

    /// Resource cells.
    #[serde(default)]
    pub resources: ResourceConfig,

    /// Agent population.
    #[serde(default)]
    pub agents: AgentPopulationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Telemetry output.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ScenarioConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first rejected value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return invalid("grid width and height must be at least 1");
        }
        self.params.validate()?;
        if let Some(schedule) = &self.schedule {
            schedule.validate().map_err(|err| ConfigError::Invalid {
                reason: err.to_string(),
            })?;
        }
        for cell in &self.resources.cells {
            if cell.good == Good::Money {
                return invalid("resource cells must grow good a or b");
            }
            self.check_on_grid(cell.position, "resource cell")?;
        }
        for spec in &self.agents.explicit {
            self.check_on_grid(spec.position, "agent")?;
            if let Some(utility) = &spec.utility {
                check_utility(utility)?;
            }
            if let Some(lambda) = spec.lambda_money {
                check_lambda(lambda)?;
            }
        }
        if self.agents.utilities.is_empty() {
            return invalid("agents.utilities must list at least one utility form");
        }
        for utility in &self.agents.utilities {
            check_utility(utility)?;
        }
        check_lambda(self.agents.lambda_money)?;
        Ok(())
    }

    fn check_on_grid(&self, pos: Position, what: &str) -> Result<(), ConfigError> {
        let on_grid = u32::try_from(pos.x).is_ok_and(|x| x < self.grid.width)
            && u32::try_from(pos.y).is_ok_and(|y| y < self.grid.height);
        if on_grid {
            Ok(())
        } else {
            invalid(&format!("{what} at {pos} lies outside the grid"))
        }
    }
}

fn invalid<T>(reason: &str) -> Result<T, ConfigError> {
    Err(ConfigError::Invalid {
        reason: reason.to_owned(),
    })
}

fn check_utility(utility: &UtilityForm) -> Result<(), ConfigError> {
    utility.validate().map_err(|err| ConfigError::Invalid {
        reason: err.to_string(),
    })
}

fn check_lambda(lambda: f64) -> Result<(), ConfigError> {
    if lambda.is_finite() && lambda > 0.0 {
        Ok(())
    } else {
        invalid("lambda_money must be positive")
    }
}

/// Scenario identity and run length.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScenarioSection {
    /// Human-readable scenario name.
    #[serde(default = "default_scenario_name")]
    pub name: String,

    /// Random seed for scenario generation.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of ticks to run.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
}

impl Default for ScenarioSection {
    fn default() -> Self {
        Self {
            name: default_scenario_name(),
            seed: default_seed(),
            ticks: default_ticks(),
        }
    }
}

/// Grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Number of columns.
    #[serde(default = "default_grid_side")]
    pub width: u32,

    /// Number of rows.
    #[serde(default = "default_grid_side")]
    pub height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: default_grid_side(),
            height: default_grid_side(),
        }
    }
}

/// Parameters consumed by search, matching, bargaining and the tick phases.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScenarioParams {
    /// Perception radius (Manhattan).
    #[serde(default = "default_vision_radius")]
    pub vision_radius: u32,

    /// Maximum partner distance at which a trade can execute.
    #[serde(default = "default_interaction_radius")]
    pub interaction_radius: u32,

    /// Manhattan steps an agent may take per tick.
    #[serde(default = "default_move_budget")]
    pub move_budget_per_tick: u32,

    /// Per-step distance discount in `(0, 1]`.
    #[serde(default = "default_beta")]
    pub beta: f64,

    /// Largest block of the sold good tried in one trade.
    #[serde(default = "default_d_a_max")]
    pub d_a_max: u32,

    /// Relative ask/bid spread around the reservation price.
    #[serde(default)]
    pub spread: f64,

    /// Minimum utility gain that counts as an improvement.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Ticks a failed pair stays barred from re-pairing.
    #[serde(default = "default_cooldown")]
    pub trade_cooldown_ticks: u64,

    /// Conversion between money units and utility units.
    #[serde(default = "default_money_scale")]
    pub money_scale: f64,

    /// Which exchange pairs are permitted.
    #[serde(default)]
    pub exchange_regime: ExchangeRegime,

    /// Evenly spaced price samples per block size.
    #[serde(default = "default_price_samples")]
    pub price_samples: u32,

    /// Cap on integer-payment prices tried per block size.
    #[serde(default = "default_max_integer_prices")]
    pub max_integer_prices: u32,

    /// Units harvested per forage.
    #[serde(default = "default_forage_rate")]
    pub forage_rate: u32,

    /// Whether two agents may target the same resource cell in one tick.
    #[serde(default = "default_true")]
    pub enable_resource_claiming: bool,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            vision_radius: default_vision_radius(),
            interaction_radius: default_interaction_radius(),
            move_budget_per_tick: default_move_budget(),
            beta: default_beta(),
            d_a_max: default_d_a_max(),
            spread: 0.0,
            epsilon: default_epsilon(),
            trade_cooldown_ticks: default_cooldown(),
            money_scale: default_money_scale(),
            exchange_regime: ExchangeRegime::default(),
            price_samples: default_price_samples(),
            max_integer_prices: default_max_integer_prices(),
            forage_rate: default_forage_rate(),
            enable_resource_claiming: default_true(),
        }
    }
}

impl ScenarioParams {
    /// The subset of parameters quote generation needs.
    pub const fn quote_params(&self) -> QuoteParams {
        QuoteParams {
            spread: self.spread,
            epsilon: self.epsilon,
            money_scale: self.money_scale,
        }
    }

    /// Check ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first rejected value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.beta > 0.0 && self.beta <= 1.0) {
            return invalid("beta must lie in (0, 1]");
        }
        if !(self.spread >= 0.0 && self.spread < 1.0) {
            return invalid("spread must lie in [0, 1)");
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return invalid("epsilon must be positive");
        }
        if !(self.money_scale.is_finite() && self.money_scale > 0.0) {
            return invalid("money_scale must be positive");
        }
        if self.d_a_max == 0 {
            return invalid("d_a_max must be at least 1");
        }
        if self.price_samples == 0 {
            return invalid("price_samples must be at least 1");
        }
        Ok(())
    }
}

/// Resource cells: explicit cells plus randomly placed ones.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceConfig {
    /// Cells at fixed positions.
    #[serde(default)]
    pub cells: Vec<ResourceSpec>,

    /// Additional cells placed at random free positions, split evenly
    /// between A and B.
    #[serde(default)]
    pub random_count: u32,

    /// Starting stock of random cells.
    #[serde(default = "default_resource_capacity")]
    pub initial_available: u32,

    /// Regrowth per tick of random cells.
    #[serde(default = "default_regen")]
    pub regen_per_tick: u32,

    /// Capacity of random cells.
    #[serde(default = "default_resource_capacity")]
    pub max_capacity: u32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            cells: Vec::new(),
            random_count: 0,
            initial_available: default_resource_capacity(),
            regen_per_tick: default_regen(),
            max_capacity: default_resource_capacity(),
        }
    }
}

/// One resource cell at a fixed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ResourceSpec {
    /// Cell position.
    pub position: Position,
    /// Good grown here.
    pub good: Good,
    /// Starting stock.
    pub available: u32,
    /// Regrowth per tick.
    #[serde(default = "default_regen")]
    pub regen_per_tick: u32,
    /// Stock ceiling.
    #[serde(default = "default_resource_capacity")]
    pub max_capacity: u32,
}

/// Agent population: explicit agents plus randomly generated ones.
///
/// Explicit agents take ids `0..n` in listing order; random agents follow.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentPopulationConfig {
    /// Agents with fixed positions and holdings.
    #[serde(default)]
    pub explicit: Vec<AgentSpec>,

    /// Number of random agents.
    #[serde(default)]
    pub random_count: u32,

    /// Upper bound (inclusive) on random starting A.
    #[serde(default = "default_max_endowment")]
    pub max_a: u32,

    /// Upper bound (inclusive) on random starting B.
    #[serde(default = "default_max_endowment")]
    pub max_b: u32,

    /// Upper bound (inclusive) on random starting money.
    #[serde(default)]
    pub max_money: u32,

    /// Utility forms drawn uniformly for random agents, and the default for
    /// explicit agents (first entry).
    #[serde(default = "default_utilities")]
    pub utilities: Vec<UtilityForm>,

    /// Default marginal utility of money.
    #[serde(default = "default_lambda")]
    pub lambda_money: f64,
}

impl Default for AgentPopulationConfig {
    fn default() -> Self {
        Self {
            explicit: Vec::new(),
            random_count: 0,
            max_a: default_max_endowment(),
            max_b: default_max_endowment(),
            max_money: 0,
            utilities: default_utilities(),
            lambda_money: default_lambda(),
        }
    }
}

/// One agent at a fixed position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentSpec {
    /// Starting position.
    pub position: Position,
    /// Starting holdings.
    pub inventory: Inventory,
    /// Utility form; the population default when absent.
    #[serde(default)]
    pub utility: Option<UtilityForm>,
    /// Marginal utility of money; the population default when absent.
    #[serde(default)]
    pub lambda_money: Option<f64>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON-formatted log lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Telemetry output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TelemetryConfig {
    /// File receiving one JSON object per trade, pairing event and tick.
    #[serde(default)]
    pub jsonl_path: Option<String>,
}

fn default_scenario_name() -> String {
    String::from("agora")
}

const fn default_seed() -> u64 {
    42
}

const fn default_ticks() -> u64 {
    100
}

const fn default_grid_side() -> u32 {
    20
}

const fn default_vision_radius() -> u32 {
    5
}

const fn default_interaction_radius() -> u32 {
    1
}

const fn default_move_budget() -> u32 {
    1
}

const fn default_beta() -> f64 {
    0.95
}

const fn default_d_a_max() -> u32 {
    5
}

const fn default_epsilon() -> f64 {
    1e-9
}

const fn default_cooldown() -> u64 {
    5
}

const fn default_money_scale() -> f64 {
    1.0
}

const fn default_price_samples() -> u32 {
    5
}

const fn default_max_integer_prices() -> u32 {
    20
}

const fn default_forage_rate() -> u32 {
    1
}

const fn default_true() -> bool {
    true
}

const fn default_regen() -> u32 {
    1
}

const fn default_resource_capacity() -> u32 {
    5
}

const fn default_max_endowment() -> u32 {
    10
}

fn default_utilities() -> Vec<UtilityForm> {
    vec![UtilityForm::cobb_douglas(0.5, 0.5)]
}

const fn default_lambda() -> f64 {
    1.0
}

fn default_log_level() -> String {
    String::from("info")
}
