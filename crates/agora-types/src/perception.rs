//! Perception snapshot assembled for each agent at the start of a tick.
//!
//! The snapshot is frozen before any decision runs: every agent decides from
//! what it saw at the start of the tick, never from another agent's
//! same-tick choices.

use serde::{Deserialize, Serialize};

use crate::enums::{Good, TickMode};
use crate::ids::AgentId;
use crate::quotes::QuoteSet;
use crate::structs::{Inventory, Position};

/// Everything one agent can see this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionSnapshot {
    /// Current tick number.
    pub tick: u64,
    /// Activities permitted this tick.
    pub mode: TickMode,
    /// The observing agent.
    pub agent_id: AgentId,
    /// The observer's position.
    pub position: Position,
    /// The observer's inventory.
    pub inventory: Inventory,
    /// The observer's quotes.
    pub quotes: QuoteSet,
    /// Other agents within vision, ascending by id.
    pub neighbors: Vec<VisibleNeighbor>,
    /// Stocked resource cells within vision, ascending by position.
    pub resources: Vec<VisibleResource>,
}

/// Another agent as seen by the observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleNeighbor {
    /// The neighbour's id.
    pub id: AgentId,
    /// Its position.
    pub position: Position,
    /// Manhattan distance from the observer.
    pub distance: u32,
    /// Whether it is already committed to a pair.
    pub paired: bool,
    /// Whether either side holds an active cooldown against the other.
    pub in_cooldown: bool,
    /// Its posted quotes.
    pub quotes: QuoteSet,
}

/// A resource cell as seen by the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleResource {
    /// Cell position.
    pub position: Position,
    /// The good that grows there.
    pub good: Good,
    /// Units available at the start of the tick.
    pub available: u32,
    /// Manhattan distance from the observer.
    pub distance: u32,
}

impl PerceptionSnapshot {
    /// Look up a visible neighbour by id.
    pub fn neighbor(&self, id: AgentId) -> Option<&VisibleNeighbor> {
        self.neighbors
            .binary_search_by_key(&id, |n| n.id)
            .ok()
            .and_then(|idx| self.neighbors.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(id: u32) -> VisibleNeighbor {
        VisibleNeighbor {
            id: AgentId::new(id),
            position: Position::new(0, 0),
            distance: 0,
            paired: false,
            in_cooldown: false,
            quotes: QuoteSet::new(),
        }
    }

    #[test]
    fn neighbor_lookup_by_id() {
        let snapshot = PerceptionSnapshot {
            tick: 1,
            mode: TickMode::Both,
            agent_id: AgentId::new(0),
            position: Position::new(0, 0),
            inventory: Inventory::default(),
            quotes: QuoteSet::new(),
            neighbors: vec![neighbor(2), neighbor(5), neighbor(9)],
            resources: Vec::new(),
        };
        assert_eq!(snapshot.neighbor(AgentId::new(5)).map(|n| n.id), Some(AgentId::new(5)));
        assert!(snapshot.neighbor(AgentId::new(3)).is_none());
    }
}
