//! Movement phase: agents step toward their targets.

use agora_agents::AgentStore;
use agora_types::{AgentId, Position, Target};
use agora_world::{Grid, SpatialIndex};
use tracing::debug;

/// Budget and stopping rules for one movement phase.
#[derive(Debug, Clone, Copy)]
pub struct MoveRules {
    /// Manhattan steps each agent may take per tick.
    pub budget: u32,
    /// Paired agents stop once this close to their partner.
    pub interaction_radius: u32,
}

/// One Manhattan step from `from` toward `to`.
///
/// The axis with the larger remaining gap moves first; ties move on x.
pub const fn step_toward(from: Position, to: Position) -> Position {
    let dx = to.x.saturating_sub(from.x);
    let dy = to.y.saturating_sub(from.y);
    if dx == 0 && dy == 0 {
        return from;
    }
    if dx.unsigned_abs() >= dy.unsigned_abs() {
        Position::new(from.x.saturating_add(dx.signum()), from.y)
    } else {
        Position::new(from.x, from.y.saturating_add(dy.signum()))
    }
}

/// Walk up to `budget` steps toward `goal`, stopping within `stop_at`.
pub fn walk(from: Position, goal: Position, stop_at: u32, budget: u32) -> Position {
    let mut pos = from;
    for _ in 0..budget {
        if pos.manhattan(goal) <= stop_at {
            break;
        }
        pos = step_toward(pos, goal);
    }
    pos
}

/// Where an agent is heading and how close it needs to get.
fn goal_of(agents: &AgentStore, id: AgentId, rules: MoveRules) -> Option<(Position, u32)> {
    let agent = agents.get(id)?;
    if let Some(partner) = agent.paired_with {
        let partner_pos = agents.get(partner)?.position;
        return Some((partner_pos, rules.interaction_radius));
    }
    match agent.target? {
        Target::Agent { id: other, position } => {
            let live = agents.get(other).map_or(position, |a| a.position);
            Some((live, rules.interaction_radius))
        }
        Target::Resource { position } => Some((position, 0)),
    }
}

/// Move every agent in ascending id order, keeping the spatial index in
/// step. Returns the number of agents that moved.
///
/// Paired agents head for the partner's position as it stands when their
/// turn comes, so an earlier mover's step is already visible.
pub fn move_agents(
    agents: &mut AgentStore,
    index: &mut SpatialIndex,
    grid: &Grid,
    rules: MoveRules,
) -> usize {
    let mut moved: usize = 0;
    for id in agents.ids() {
        let Some((goal, stop_at)) = goal_of(agents, id, rules) else {
            continue;
        };
        let Some(agent) = agents.get_mut(id) else {
            continue;
        };
        let old = agent.position;
        let new = grid.clamp(walk(old, goal, stop_at, rules.budget));
        if new != old {
            agent.position = new;
            index.update(id, old, new);
            moved = moved.saturating_add(1);
            debug!(agent_id = %id, from = %old, to = %new, "Agent moved");
        }
    }
    moved
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_agents::{Agent, UtilityForm};
    use agora_types::Inventory;

    use super::*;

    fn agent(id: u32, x: i32, y: i32) -> Agent {
        Agent::new(
            AgentId::new(id),
            Position::new(x, y),
            Inventory::new(1, 1, 0),
            UtilityForm::cobb_douglas(0.5, 0.5),
            1.0,
        )
    }

    fn world(agent_list: Vec<Agent>) -> (AgentStore, SpatialIndex, Grid) {
        let mut agents = AgentStore::new();
        let mut index = SpatialIndex::new(3);
        for a in agent_list {
            index.insert(a.id, a.position);
            agents.insert(a).unwrap();
        }
        (agents, index, Grid::new(10, 10).unwrap())
    }

    #[test]
    fn larger_gap_axis_moves_first() {
        let from = Position::new(0, 0);
        assert_eq!(step_toward(from, Position::new(1, 3)), Position::new(0, 1));
        assert_eq!(step_toward(from, Position::new(-3, 1)), Position::new(-1, 0));
        assert_eq!(step_toward(from, Position::new(2, 2)), Position::new(1, 0));
        assert_eq!(step_toward(from, from), from);
    }

    #[test]
    fn walk_respects_budget_and_stop_distance() {
        let from = Position::new(0, 0);
        assert_eq!(walk(from, Position::new(5, 0), 0, 2), Position::new(2, 0));
        assert_eq!(walk(from, Position::new(2, 0), 1, 5), Position::new(1, 0));
        assert_eq!(walk(from, Position::new(2, 2), 0, 4), Position::new(2, 2));
    }

    #[test]
    fn resource_target_reached_and_index_updated() {
        let mut a = agent(0, 0, 0);
        a.target = Some(Target::Resource {
            position: Position::new(2, 1),
        });
        let (mut agents, mut index, grid) = world(vec![a]);
        let rules = MoveRules {
            budget: 5,
            interaction_radius: 1,
        };
        assert_eq!(move_agents(&mut agents, &mut index, &grid, rules), 1);
        assert_eq!(agents.get(AgentId::new(0)).unwrap().position, Position::new(2, 1));
        assert_eq!(index.position(AgentId::new(0)), Some(Position::new(2, 1)));
    }

    #[test]
    fn paired_agents_close_in_until_interaction_range() {
        let (mut agents, mut index, grid) = world(vec![agent(0, 0, 0), agent(1, 6, 0)]);
        agents.pair(AgentId::new(0), AgentId::new(1)).unwrap();
        let rules = MoveRules {
            budget: 2,
            interaction_radius: 1,
        };
        move_agents(&mut agents, &mut index, &grid, rules);
        // 0 moves first to (2,0); 1 then walks toward (2,0).
        assert_eq!(agents.get(AgentId::new(0)).unwrap().position, Position::new(2, 0));
        assert_eq!(agents.get(AgentId::new(1)).unwrap().position, Position::new(4, 0));
        move_agents(&mut agents, &mut index, &grid, rules);
        let p0 = agents.get(AgentId::new(0)).unwrap().position;
        let p1 = agents.get(AgentId::new(1)).unwrap().position;
        assert_eq!(p0, Position::new(3, 0));
        assert_eq!(p1, Position::new(4, 0));
        assert_eq!(p0.manhattan(p1), 1);
    }

    #[test]
    fn idle_agents_stay_put() {
        let (mut agents, mut index, grid) = world(vec![agent(0, 4, 4)]);
        let rules = MoveRules {
            budget: 3,
            interaction_radius: 1,
        };
        assert_eq!(move_agents(&mut agents, &mut index, &grid, rules), 0);
        assert_eq!(agents.get(AgentId::new(0)).unwrap().position, Position::new(4, 4));
    }

    #[test]
    fn off_grid_targets_are_clamped() {
        let mut a = agent(0, 9, 9);
        a.target = Some(Target::Resource {
            position: Position::new(12, 9),
        });
        let (mut agents, mut index, grid) = world(vec![a]);
        let rules = MoveRules {
            budget: 3,
            interaction_radius: 1,
        };
        move_agents(&mut agents, &mut index, &grid, rules);
        assert_eq!(agents.get(AgentId::new(0)).unwrap().position, Position::new(9, 9));
    }
}
