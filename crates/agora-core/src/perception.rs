//! Perception assembly for the Perception phase of the tick cycle.
//!
//! Each agent sees the other agents within `vision_radius` (via the spatial
//! index) and the stocked resource cells within the same radius. The
//! snapshot is built once per tick before any decision runs and is never
//! updated mid-tick. Quotes are copied restricted to the exchange regime.

use std::collections::BTreeMap;

use agora_agents::{Agent, AgentStore, filter_quotes};
use agora_types::{
    AgentId, ExchangeRegime, PerceptionSnapshot, TickMode, VisibleNeighbor, VisibleResource,
};
use agora_world::{Grid, SpatialIndex};

/// Context shared by every snapshot built in one tick.
#[derive(Debug, Clone, Copy)]
pub struct PerceptionContext<'a> {
    /// All agents.
    pub agents: &'a AgentStore,
    /// Agent positions.
    pub index: &'a SpatialIndex,
    /// Resource cells.
    pub grid: &'a Grid,
    /// Perception radius.
    pub vision_radius: u32,
    /// The current tick.
    pub tick: u64,
    /// Activities permitted this tick.
    pub mode: TickMode,
    /// Pairs whose quotes are visible.
    pub regime: ExchangeRegime,
}

/// Build one agent's snapshot.
pub fn assemble_perception(agent: &Agent, ctx: &PerceptionContext<'_>) -> PerceptionSnapshot {
    let neighbors = ctx
        .index
        .query_radius(agent.position, ctx.vision_radius)
        .into_iter()
        .filter(|id| *id != agent.id)
        .filter_map(|id| ctx.agents.get(id))
        .map(|other| VisibleNeighbor {
            id: other.id,
            position: other.position,
            distance: agent.position.manhattan(other.position),
            paired: other.is_paired(),
            in_cooldown: ctx.agents.cooldown_active(agent.id, other.id, ctx.tick),
            quotes: filter_quotes(&other.quotes, ctx.regime),
        })
        .collect();

    let resources = ctx
        .grid
        .stocked_within(agent.position, ctx.vision_radius)
        .into_iter()
        .map(|cell| VisibleResource {
            position: cell.position,
            good: cell.good,
            available: cell.available,
            distance: agent.position.manhattan(cell.position),
        })
        .collect();

    PerceptionSnapshot {
        tick: ctx.tick,
        mode: ctx.mode,
        agent_id: agent.id,
        position: agent.position,
        inventory: agent.inventory,
        quotes: filter_quotes(&agent.quotes, ctx.regime),
        neighbors,
        resources,
    }
}

/// Build snapshots for every agent, keyed by id.
pub fn assemble_all(ctx: &PerceptionContext<'_>) -> BTreeMap<AgentId, PerceptionSnapshot> {
    ctx.agents
        .iter()
        .map(|agent| (agent.id, assemble_perception(agent, ctx)))
        .collect()
}
