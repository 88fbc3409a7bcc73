//! Target search (pass 1 of the decision phase).
//!
//! Every unpaired agent ranks the partners and resource cells it can see
//! by distance-discounted surplus. Search never mutates pairing state: it
//! only produces preference lists and, when claiming is enabled, the set of
//! resource cells reserved by agents whose top choice is a cell.

use std::collections::{BTreeMap, BTreeSet};

use agora_agents::{AgentStore, Utility};
use agora_types::{AgentId, Candidate, Good, PerceptionSnapshot, Position, PreferenceEntry};
use tracing::debug;

use crate::bargaining;
use crate::config::ScenarioParams;
use crate::protocol::SearchProtocol;

/// Discount a surplus by `beta^distance`.
pub fn discount(surplus: f64, beta: f64, distance: u32) -> f64 {
    surplus * beta.powf(f64::from(distance))
}

/// Partner entries: visible agents that are unpaired, outside any mutual
/// cooldown, and show a positive quote overlap.
pub fn partner_entries(
    snapshot: &PerceptionSnapshot,
    params: &ScenarioParams,
) -> Vec<PreferenceEntry> {
    snapshot
        .neighbors
        .iter()
        .filter(|neighbor| !neighbor.paired && !neighbor.in_cooldown)
        .filter_map(|neighbor| {
            let (pair, surplus) = bargaining::best_estimate(
                &snapshot.quotes,
                &neighbor.quotes,
                params.exchange_regime,
            )?;
            let discounted = discount(surplus, params.beta, neighbor.distance);
            (discounted > 0.0).then_some(PreferenceEntry {
                candidate: Candidate::Agent(neighbor.id),
                surplus,
                discounted,
                distance: neighbor.distance,
                pair_type: Some(pair),
            })
        })
        .collect()
}

/// Resource entries: visible stocked cells not claimed by another agent,
/// scored by the utility gain of one forage.
pub fn resource_entries(
    snapshot: &PerceptionSnapshot,
    utility: &dyn Utility,
    params: &ScenarioParams,
    claimed: &BTreeSet<Position>,
) -> Vec<PreferenceEntry> {
    let a = snapshot.inventory.a;
    let b = snapshot.inventory.b;
    let base = utility.utility_of_goods(f64::from(a), f64::from(b));
    snapshot
        .resources
        .iter()
        .filter(|cell| !claimed.contains(&cell.position))
        .filter_map(|cell| {
            let harvest = params.forage_rate.min(cell.available);
            let gained = match cell.good {
                Good::A => {
                    utility.utility_of_goods(f64::from(a.saturating_add(harvest)), f64::from(b))
                }
                Good::B => {
                    utility.utility_of_goods(f64::from(a), f64::from(b.saturating_add(harvest)))
                }
                Good::Money => return None,
            };
            let surplus = gained - base;
            let discounted = discount(surplus, params.beta, cell.distance);
            (discounted > 0.0 && discounted.is_finite()).then_some(PreferenceEntry {
                candidate: Candidate::Resource(cell.position),
                surplus,
                discounted,
                distance: cell.distance,
                pair_type: None,
            })
        })
        .collect()
}

/// Build and sort one agent's preference list, gated by the tick mode.
pub fn build_preferences(
    snapshot: &PerceptionSnapshot,
    utility: &dyn Utility,
    params: &ScenarioParams,
    claimed: &BTreeSet<Position>,
) -> Vec<PreferenceEntry> {
    let mut entries = Vec::new();
    if snapshot.mode.allows_trade() {
        entries.extend(partner_entries(snapshot, params));
    }
    if snapshot.mode.allows_forage() {
        entries.extend(resource_entries(snapshot, utility, params, claimed));
    }
    entries.sort_by(PreferenceEntry::ranking_cmp);
    entries
}

/// Output of the search pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    /// Sorted preference lists for every agent unpaired at the start of the
    /// tick, possibly empty.
    pub preferences: BTreeMap<AgentId, Vec<PreferenceEntry>>,
    /// Cells reserved by agents whose top choice is a cell.
    pub claimed: BTreeSet<Position>,
}

impl SearchOutcome {
    /// The top entry of an agent's list.
    pub fn top(&self, id: AgentId) -> Option<&PreferenceEntry> {
        self.preferences.get(&id).and_then(|list| list.first())
    }

    /// Whether the agent's top entry is a partner.
    pub fn is_trade_seeking(&self, id: AgentId) -> bool {
        self.top(id).is_some_and(|entry| entry.candidate.agent().is_some())
    }
}

/// Run pass 1 for every unpaired agent in ascending id order.
pub fn run_search(
    protocol: &dyn SearchProtocol,
    agents: &AgentStore,
    snapshots: &BTreeMap<AgentId, PerceptionSnapshot>,
    params: &ScenarioParams,
) -> SearchOutcome {
    let mut outcome = SearchOutcome::default();
    for agent in agents.iter().filter(|agent| !agent.is_paired()) {
        let Some(snapshot) = snapshots.get(&agent.id) else {
            continue;
        };
        let list = protocol.build_preferences(snapshot, agent.utility(), params, &outcome.claimed);
        if let Some(top) = protocol.select_target(&list) {
            if let Candidate::Resource(pos) = top.candidate {
                if params.enable_resource_claiming {
                    outcome.claimed.insert(pos);
                }
            }
            debug!(
                tick = snapshot.tick,
                agent_id = %agent.id,
                candidate = ?top.candidate,
                discounted = top.discounted,
                "Tentative target selected"
            );
        }
        outcome.preferences.insert(agent.id, list);
    }
    outcome
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_agents::UtilityForm;
    use agora_types::{
        Inventory, PairType, QuoteKey, QuoteSet, TickMode, VisibleNeighbor, VisibleResource,
    };

    use super::*;

    fn quotes(ask: f64, bid: f64) -> QuoteSet {
        let mut q = QuoteSet::new();
        q.insert(QuoteKey::ask(PairType::AForB), ask);
        q.insert(QuoteKey::bid(PairType::AForB), bid);
        q
    }

    fn neighbor(id: u32, distance: u32, quotes: QuoteSet) -> VisibleNeighbor {
        VisibleNeighbor {
            id: AgentId::new(id),
            position: Position::new(i32::try_from(distance).unwrap(), 0),
            distance,
            paired: false,
            in_cooldown: false,
            quotes,
        }
    }

    fn snapshot(
        mode: TickMode,
        neighbors: Vec<VisibleNeighbor>,
        resources: Vec<VisibleResource>,
    ) -> PerceptionSnapshot {
        PerceptionSnapshot {
            tick: 1,
            mode,
            agent_id: AgentId::new(0),
            position: Position::new(0, 0),
            inventory: Inventory::new(2, 2, 0),
            quotes: quotes(1.0, 1.0),
            neighbors,
            resources,
        }
    }

    fn cell(x: i32, good: Good) -> VisibleResource {
        VisibleResource {
            position: Position::new(x, 0),
            good,
            available: 3,
            distance: x.unsigned_abs(),
        }
    }

    #[test]
    fn discount_decays_with_distance() {
        assert!((discount(2.0, 0.5, 2) - 0.5).abs() < 1e-12);
        assert!((discount(2.0, 0.5, 0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn skips_paired_cooldown_and_non_overlapping_neighbors() {
        let mut paired = neighbor(1, 1, quotes(3.0, 3.0));
        paired.paired = true;
        let mut cooling = neighbor(2, 1, quotes(3.0, 3.0));
        cooling.in_cooldown = true;
        let flat = neighbor(3, 1, quotes(1.0, 1.0));
        let good = neighbor(4, 2, quotes(3.0, 3.0));
        let snap = snapshot(TickMode::Trade, vec![paired, cooling, flat, good], Vec::new());
        let entries = partner_entries(&snap, &ScenarioParams::default());
        assert_eq!(entries.len(), 1);
        let entry = entries.first().unwrap();
        assert_eq!(entry.candidate, Candidate::Agent(AgentId::new(4)));
        assert!((entry.surplus - 2.0).abs() < 1e-12);
    }

    #[test]
    fn equal_scores_prefer_lower_id() {
        let snap = snapshot(
            TickMode::Trade,
            vec![neighbor(7, 1, quotes(3.0, 3.0)), neighbor(3, 1, quotes(3.0, 3.0))],
            Vec::new(),
        );
        let u = UtilityForm::cobb_douglas(0.5, 0.5);
        let list = build_preferences(&snap, &u, &ScenarioParams::default(), &BTreeSet::new());
        assert_eq!(list.first().unwrap().candidate, Candidate::Agent(AgentId::new(3)));
    }

    #[test]
    fn mode_gates_candidate_kinds() {
        let u = UtilityForm::cobb_douglas(0.5, 0.5);
        let params = ScenarioParams::default();
        let neighbors = vec![neighbor(1, 1, quotes(3.0, 3.0))];
        let resources = vec![cell(2, Good::A)];
        let forage = snapshot(TickMode::Forage, neighbors.clone(), resources.clone());
        let trade = snapshot(TickMode::Trade, neighbors.clone(), resources.clone());
        let both = snapshot(TickMode::Both, neighbors, resources);
        let none = BTreeSet::new();
        let f = build_preferences(&forage, &u, &params, &none);
        assert!(f.iter().all(|e| e.candidate.agent().is_none()));
        assert_eq!(f.len(), 1);
        let t = build_preferences(&trade, &u, &params, &none);
        assert!(t.iter().all(|e| e.candidate.agent().is_some()));
        assert_eq!(build_preferences(&both, &u, &params, &none).len(), 2);
    }

    #[test]
    fn claimed_cells_skipped() {
        let u = UtilityForm::cobb_douglas(0.5, 0.5);
        let snap = snapshot(TickMode::Forage, Vec::new(), vec![cell(1, Good::A), cell(2, Good::B)]);
        let claimed: BTreeSet<_> = [Position::new(1, 0)].into_iter().collect();
        let list = build_preferences(&snap, &u, &ScenarioParams::default(), &claimed);
        assert_eq!(list.len(), 1);
        assert_eq!(list.first().unwrap().candidate, Candidate::Resource(Position::new(2, 0)));
    }

    #[test]
    fn no_positive_candidate_gives_empty_list() {
        let u = UtilityForm::cobb_douglas(0.5, 0.5);
        let snap = snapshot(TickMode::Both, vec![neighbor(1, 1, quotes(1.0, 1.0))], Vec::new());
        let list = build_preferences(&snap, &u, &ScenarioParams::default(), &BTreeSet::new());
        assert!(list.is_empty());
    }
}
