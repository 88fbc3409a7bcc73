//! Scenario generation: builds the initial simulation state from a
//! [`ScenarioConfig`].
//!
//! Explicit agents and resource cells are placed as listed. Random agents
//! and cells are drawn from a `StdRng` seeded with `scenario.seed`, so the
//! same configuration always yields the same world. This is the only place
//! the simulation draws randomness.

use std::collections::BTreeSet;

use agora_agents::{Agent, AgentStore, UtilityForm};
use agora_types::{AgentId, Good, Inventory, Position, ResourceCell};
use agora_world::{Grid, SpatialIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::clock::WorldClock;
use crate::config::{AgentPopulationConfig, ConfigError, ResourceConfig, ScenarioConfig};
use crate::tick::SimulationState;

/// Errors raised while building the initial state.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// The configuration failed validation.
    #[error("invalid scenario: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// An agent could not be registered.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: agora_agents::AgentError,
    },

    /// The grid or a resource cell was rejected.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: agora_world::WorldError,
    },

    /// The mode schedule was rejected.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: crate::clock::ClockError,
    },

    /// More random resource cells were requested than free cells exist.
    #[error("cannot place {requested} random resource cells: only {free} free cells")]
    NoFreeCell {
        /// Cells requested.
        requested: u32,
        /// Free cells available.
        free: usize,
    },

    /// The population exceeds the id space.
    #[error("too many agents")]
    TooManyAgents,
}

/// Build a ready-to-run state from a validated configuration.
///
/// Every agent starts unpaired with fresh quotes.
///
/// # Errors
///
/// Returns [`SpawnError`] if the configuration is invalid or the world
/// cannot hold the requested population.
pub fn build_state(config: &ScenarioConfig) -> Result<SimulationState, SpawnError> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.scenario.seed);

    let clock = WorldClock::new(config.schedule)?;
    let mut grid = Grid::new(config.grid.width, config.grid.height)?;
    place_resources(&mut grid, &config.resources, &mut rng)?;

    let mut agents = spawn_agents(&config.agents, &grid, &mut rng)?;
    let quote_params = config.params.quote_params();
    for agent in agents.iter_mut() {
        agent.refresh_quotes(config.params.exchange_regime, &quote_params);
    }

    let mut index =
        SpatialIndex::for_radii(config.params.vision_radius, config.params.interaction_radius);
    for agent in agents.iter() {
        index.insert(agent.id, agent.position);
    }

    info!(
        scenario = %config.scenario.name,
        seed = config.scenario.seed,
        agents = agents.len(),
        resources = grid.resource_count(),
        width = grid.width(),
        height = grid.height(),
        "Scenario built"
    );

    Ok(SimulationState {
        clock,
        grid,
        index,
        agents,
        params: config.params,
    })
}

fn random_position(rng: &mut impl Rng, grid: &Grid) -> Position {
    let x = rng.random_range(0..grid.width());
    let y = rng.random_range(0..grid.height());
    Position::new(
        i32::try_from(x).unwrap_or(i32::MAX),
        i32::try_from(y).unwrap_or(i32::MAX),
    )
}

/// Place explicit cells, then `random_count` cells at distinct free
/// positions alternating A and B.
fn place_resources(
    grid: &mut Grid,
    config: &ResourceConfig,
    rng: &mut impl Rng,
) -> Result<(), SpawnError> {
    for spec in &config.cells {
        grid.add_resource(ResourceCell {
            position: spec.position,
            good: spec.good,
            available: spec.available.min(spec.max_capacity),
            regen_per_tick: spec.regen_per_tick,
            max_capacity: spec.max_capacity,
        })?;
    }
    if config.random_count == 0 {
        return Ok(());
    }

    let taken: BTreeSet<Position> = grid.resources().map(|cell| cell.position).collect();
    let mut free: Vec<Position> = (0..grid.height())
        .flat_map(|y| (0..grid.width()).map(move |x| (x, y)))
        .filter_map(|(x, y)| Some(Position::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?)))
        .filter(|pos| !taken.contains(pos))
        .collect();
    let requested = usize::try_from(config.random_count).unwrap_or(usize::MAX);
    if requested > free.len() {
        return Err(SpawnError::NoFreeCell {
            requested: config.random_count,
            free: free.len(),
        });
    }

    // Partial Fisher-Yates: the first `requested` slots become the sample.
    for i in 0..requested {
        let j = rng.random_range(i..free.len());
        free.swap(i, j);
    }
    for (i, position) in free.into_iter().take(requested).enumerate() {
        let good = if i % 2 == 0 { Good::A } else { Good::B };
        grid.add_resource(ResourceCell {
            position,
            good,
            available: config.initial_available.min(config.max_capacity),
            regen_per_tick: config.regen_per_tick,
            max_capacity: config.max_capacity,
        })?;
    }
    Ok(())
}

/// Explicit agents take ids `0..n`; random agents follow.
fn spawn_agents(
    config: &AgentPopulationConfig,
    grid: &Grid,
    rng: &mut impl Rng,
) -> Result<AgentStore, SpawnError> {
    let default_utility = config
        .utilities
        .first()
        .copied()
        .unwrap_or_else(|| UtilityForm::cobb_douglas(0.5, 0.5));
    let mut agents = AgentStore::new();
    let mut next_id: u32 = 0;

    for spec in &config.explicit {
        agents.insert(Agent::new(
            AgentId::new(next_id),
            spec.position,
            spec.inventory,
            spec.utility.unwrap_or(default_utility),
            spec.lambda_money.unwrap_or(config.lambda_money),
        ))?;
        next_id = next_id.checked_add(1).ok_or(SpawnError::TooManyAgents)?;
    }

    for _ in 0..config.random_count {
        let position = random_position(rng, grid);
        let inventory = Inventory::new(
            rng.random_range(0..=config.max_a),
            rng.random_range(0..=config.max_b),
            rng.random_range(0..=config.max_money),
        );
        let pick = rng.random_range(0..config.utilities.len().max(1));
        let utility = config.utilities.get(pick).copied().unwrap_or(default_utility);
        agents.insert(Agent::new(
            AgentId::new(next_id),
            position,
            inventory,
            utility,
            config.lambda_money,
        ))?;
        next_id = next_id.checked_add(1).ok_or(SpawnError::TooManyAgents)?;
    }
    Ok(agents)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_types::PairType;

    use super::*;

    const YAML: &str = r"
scenario:
  seed: 7
grid:
  width: 6
  height: 6
resources:
  cells:
    - position: { x: 0, y: 0 }
      good: a
      available: 9
      max_capacity: 4
  random_count: 4
agents:
  explicit:
    - position: { x: 1, y: 1 }
      inventory: { a: 10, b: 0 }
  random_count: 5
";

    #[test]
    fn same_seed_builds_the_same_world() {
        let config = ScenarioConfig::parse(YAML).unwrap();
        let first = build_state(&config).unwrap();
        let second = build_state(&config).unwrap();
        assert_eq!(first.agents, second.agents);
        assert_eq!(first.grid, second.grid);
    }

    #[test]
    fn explicit_entries_come_first() {
        let config = ScenarioConfig::parse(YAML).unwrap();
        let state = build_state(&config).unwrap();
        assert_eq!(state.agents.len(), 6);
        let first = state.agents.get(AgentId::new(0)).unwrap();
        assert_eq!(first.position, Position::new(1, 1));
        assert_eq!(first.inventory, Inventory::new(10, 0, 0));
        assert_eq!(state.grid.resource_count(), 5);
        assert_eq!(state.grid.resource_at(Position::new(0, 0)).unwrap().available, 4);
    }

    #[test]
    fn agents_start_indexed_with_fresh_quotes() {
        let config = ScenarioConfig::parse(YAML).unwrap();
        let state = build_state(&config).unwrap();
        for agent in state.agents.iter() {
            assert!(!agent.quotes_stale);
            assert!(agent.quotes.ask(PairType::AForB).is_some());
            assert!(state.grid.contains(agent.position));
            assert_eq!(state.index.position(agent.id), Some(agent.position));
        }
    }

    #[test]
    fn too_many_random_cells_rejected() {
        let mut config = ScenarioConfig::parse(YAML).unwrap();
        config.resources.random_count = 36;
        assert!(matches!(
            build_state(&config),
            Err(SpawnError::NoFreeCell { requested: 36, free: 35 })
        ));
    }
}
