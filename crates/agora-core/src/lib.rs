//! Tick cycle, decision passes, and trade matching for the Agora exchange
//! simulation.
//!
//! This crate owns the eight-phase tick cycle: Wake, Perception, Decision,
//! Movement, Trade, Forage, Regeneration, and Housekeeping. Everything it
//! does is deterministic; only [`spawner`] draws randomness, from a seeded
//! generator.
//!
//! # Modules
//!
//! - [`bargaining`] -- Fast surplus estimator and the compensating-block
//!   trade search.
//! - [`clock`] -- World clock and the optional forage/trade schedule.
//! - [`config`] -- Scenario configuration loaded from YAML.
//! - [`executor`] -- Validated trade execution and failed-match cooldowns.
//! - [`forage`] -- Harvesting by unpaired agents.
//! - [`housekeeping`] -- Quote refresh and the pairing integrity check.
//! - [`matching`] -- Mutual-consent and greedy pairing passes.
//! - [`movement`] -- Manhattan stepping toward targets.
//! - [`perception`] -- Per-agent snapshot assembly.
//! - [`protocol`] -- Swappable search, matching and bargaining strategies.
//! - [`runner`] -- Bounded multi-tick loop.
//! - [`search`] -- Distance-discounted preference lists.
//! - [`spawner`] -- Seeded scenario generation.
//! - [`telemetry`] -- [`TelemetrySink`] and in-memory sinks.
//! - [`tick`] -- The tick cycle itself.
//!
//! [`TelemetrySink`]: telemetry::TelemetrySink

pub mod bargaining;
pub mod clock;
pub mod config;
pub mod executor;
pub mod forage;
pub mod housekeeping;
pub mod matching;
pub mod movement;
pub mod perception;
pub mod protocol;
pub mod runner;
pub mod search;
pub mod spawner;
pub mod telemetry;
pub mod tick;

pub use config::{ScenarioConfig, ScenarioParams};
pub use protocol::Protocols;
pub use runner::{RunnerError, SimulationResult, run_simulation};
pub use spawner::{SpawnError, build_state};
pub use telemetry::{MemorySink, NoOpSink, TelemetrySink};
pub use tick::{SimulationState, TickError, TickSummary, run_tick};
