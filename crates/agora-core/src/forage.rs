//! Forage phase: unpaired agents harvest the cell they stand on.

use agora_agents::{AgentStore, inventory};
use agora_types::Good;
use agora_world::{Grid, resource};
use tracing::debug;

use crate::tick::TickError;

/// Let every unpaired agent standing on a stocked cell harvest up to
/// `forage_rate` units, in ascending id order.
///
/// Harvesting agents have their quotes marked stale. Returns the total
/// quantity harvested.
///
/// # Errors
///
/// Returns [`TickError`] if an inventory or cell update overflows.
pub fn forage(
    agents: &mut AgentStore,
    grid: &mut Grid,
    tick: u64,
    forage_rate: u32,
) -> Result<u64, TickError> {
    let mut total: u64 = 0;
    for agent in agents.iter_mut().filter(|agent| !agent.is_paired()) {
        let Some(cell) = grid.resource_at_mut(agent.position) else {
            continue;
        };
        if cell.available == 0 || cell.good == Good::Money {
            continue;
        }
        let mut next = agent.inventory;
        inventory::add_good(&mut next, cell.good, forage_rate.min(cell.available))?;
        let taken = resource::harvest(cell, forage_rate)?;
        agent.inventory = next;
        agent.quotes_stale = true;
        total = total.saturating_add(u64::from(taken));
        debug!(tick, agent_id = %agent.id, good = ?cell.good, taken, "Agent foraged");
    }
    Ok(total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_agents::{Agent, UtilityForm};
    use agora_types::{AgentId, Inventory, Position, ResourceCell};

    use super::*;

    fn setup() -> (AgentStore, Grid) {
        let mut agents = AgentStore::new();
        for (id, x) in [(0, 0), (1, 0), (2, 5)] {
            let mut agent = Agent::new(
                AgentId::new(id),
                Position::new(x, 0),
                Inventory::new(0, 0, 0),
                UtilityForm::cobb_douglas(0.5, 0.5),
                1.0,
            );
            agent.quotes_stale = false;
            agents.insert(agent).unwrap();
        }
        let mut grid = Grid::new(8, 8).unwrap();
        grid.add_resource(ResourceCell {
            position: Position::new(0, 0),
            good: Good::A,
            available: 3,
            regen_per_tick: 1,
            max_capacity: 3,
        })
        .unwrap();
        (agents, grid)
    }

    #[test]
    fn co_located_agents_harvest_in_id_order() {
        let (mut agents, mut grid) = setup();
        let total = forage(&mut agents, &mut grid, 1, 2).unwrap();
        assert_eq!(total, 3);
        assert_eq!(agents.get(AgentId::new(0)).unwrap().inventory.a, 2);
        assert_eq!(agents.get(AgentId::new(1)).unwrap().inventory.a, 1);
        assert!(agents.get(AgentId::new(1)).unwrap().quotes_stale);
        assert!(!agents.get(AgentId::new(2)).unwrap().quotes_stale);
        assert_eq!(grid.resource_at(Position::new(0, 0)).unwrap().available, 0);
    }

    #[test]
    fn paired_agents_do_not_forage() {
        let (mut agents, mut grid) = setup();
        agents.pair(AgentId::new(0), AgentId::new(1)).unwrap();
        assert_eq!(forage(&mut agents, &mut grid, 1, 2).unwrap(), 0);
        assert_eq!(grid.resource_at(Position::new(0, 0)).unwrap().available, 3);
    }
}
