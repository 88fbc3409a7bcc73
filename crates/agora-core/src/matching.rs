//! Pairing (passes 2 and 3 of the decision phase).
//!
//! Pass 2 commits pairs whose members rank each other first. Pass 3 pools
//! every partner entry of every agent still unpaired and commits greedily by
//! descending discounted surplus. Trade-seeking agents still unpaired after
//! both passes fall back to their best unclaimed resource cell, or idle.
//!
//! [`find_matches`] is pure: it reads the search outcome and the agent store
//! and returns [`PairingEffect`]s for the tick orchestrator to apply.

use std::collections::BTreeSet;

use agora_agents::AgentStore;
use agora_types::{AgentId, Candidate, PairingReason, Position, pair_key};

use crate::search::SearchOutcome;

/// A decision produced by matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingEffect {
    /// Commit two agents to each other.
    Pair {
        /// Lower id.
        first: AgentId,
        /// Higher id.
        second: AgentId,
        /// Which pass committed the pair.
        reason: PairingReason,
    },
    /// A trade-seeking agent left unpaired retargets.
    Fallback {
        /// The agent.
        agent: AgentId,
        /// Its best unclaimed resource cell, or `None` to idle.
        resource: Option<Position>,
    },
}

/// Read-only context for matching.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    /// All agents, as of the start of the decision phase.
    pub agents: &'a AgentStore,
    /// The current tick.
    pub tick: u64,
    /// Whether fallback targets respect and extend resource claims.
    pub enable_resource_claiming: bool,
}

/// Greedy-pass candidate: proposer, partner, discounted score.
struct Proposal {
    proposer: AgentId,
    partner: AgentId,
    discounted: f64,
}

/// Run passes 2 and 3 plus fallback retargeting.
pub fn find_matches(search: &SearchOutcome, ctx: &MatchContext<'_>) -> Vec<PairingEffect> {
    let mut effects = Vec::new();
    let mut committed: BTreeSet<AgentId> = BTreeSet::new();

    let eligible = |committed: &BTreeSet<AgentId>, i: AgentId, j: AgentId| {
        i != j
            && !committed.contains(&i)
            && !committed.contains(&j)
            && search.preferences.contains_key(&i)
            && search.preferences.contains_key(&j)
            && !ctx.agents.cooldown_active(i, j, ctx.tick)
    };

    // Pass 2: mutual consent.
    for &i in search.preferences.keys() {
        let Some(j) = search.top(i).and_then(|entry| entry.candidate.agent()) else {
            continue;
        };
        let mutual = search
            .top(j)
            .is_some_and(|entry| entry.candidate == Candidate::Agent(i));
        if mutual && eligible(&committed, i, j) {
            let (first, second) = pair_key(i, j);
            committed.insert(first);
            committed.insert(second);
            effects.push(PairingEffect::Pair {
                first,
                second,
                reason: PairingReason::MutualConsent,
            });
        }
    }

    // Pass 3: greedy fallback over every partner entry of still-unpaired
    // agents, whatever their top entry.
    let mut proposals: Vec<Proposal> = search
        .preferences
        .iter()
        .filter(|(id, _)| !committed.contains(*id))
        .flat_map(|(id, list)| {
            list.iter().filter_map(move |entry| {
                entry.candidate.agent().map(|partner| Proposal {
                    proposer: *id,
                    partner,
                    discounted: entry.discounted,
                })
            })
        })
        .collect();
    proposals.sort_by(|x, y| {
        y.discounted
            .total_cmp(&x.discounted)
            .then_with(|| pair_key(x.proposer, x.partner).cmp(&pair_key(y.proposer, y.partner)))
            .then_with(|| x.proposer.cmp(&y.proposer))
    });
    for proposal in &proposals {
        let (i, j) = (proposal.proposer, proposal.partner);
        if eligible(&committed, i, j) {
            let (first, second) = pair_key(i, j);
            committed.insert(first);
            committed.insert(second);
            effects.push(PairingEffect::Pair {
                first,
                second,
                reason: PairingReason::GreedyFallback,
            });
        }
    }

    // Cells claimed in pass 1 by agents that ended up paired are free again.
    let mut claimed = search.claimed.clone();
    for id in &committed {
        if let Some(Candidate::Resource(pos)) = search.top(*id).map(|entry| entry.candidate) {
            claimed.remove(&pos);
        }
    }

    // Fallback: unpaired trade-seekers take their best free cell.
    for (&id, list) in &search.preferences {
        if committed.contains(&id) || !search.is_trade_seeking(id) {
            continue;
        }
        let resource = list.iter().find_map(|entry| match entry.candidate {
            Candidate::Resource(pos)
                if !(ctx.enable_resource_claiming && claimed.contains(&pos)) =>
            {
                Some(pos)
            }
            _ => None,
        });
        if let Some(pos) = resource {
            if ctx.enable_resource_claiming {
                claimed.insert(pos);
            }
        }
        effects.push(PairingEffect::Fallback { agent: id, resource });
    }

    effects
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_agents::{Agent, UtilityForm};
    use agora_types::{Inventory, PairType, PreferenceEntry};

    use super::*;

    fn store(n: u32) -> AgentStore {
        let mut agents = AgentStore::new();
        for id in 0..n {
            agents
                .insert(Agent::new(
                    AgentId::new(id),
                    Position::new(0, 0),
                    Inventory::new(1, 1, 0),
                    UtilityForm::cobb_douglas(0.5, 0.5),
                    1.0,
                ))
                .unwrap();
        }
        agents
    }

    fn partner(id: u32, discounted: f64) -> PreferenceEntry {
        PreferenceEntry {
            candidate: Candidate::Agent(AgentId::new(id)),
            surplus: discounted,
            discounted,
            distance: 1,
            pair_type: Some(PairType::AForB),
        }
    }

    fn cell(x: i32, discounted: f64) -> PreferenceEntry {
        PreferenceEntry {
            candidate: Candidate::Resource(Position::new(x, 0)),
            surplus: discounted,
            discounted,
            distance: 1,
            pair_type: None,
        }
    }

    fn outcome(lists: Vec<(u32, Vec<PreferenceEntry>)>) -> SearchOutcome {
        SearchOutcome {
            preferences: lists.into_iter().map(|(id, l)| (AgentId::new(id), l)).collect(),
            claimed: BTreeSet::new(),
        }
    }

    fn pairs(effects: &[PairingEffect]) -> Vec<(u32, u32, PairingReason)> {
        effects
            .iter()
            .filter_map(|e| match e {
                PairingEffect::Pair { first, second, reason } => {
                    Some((first.into_inner(), second.into_inner(), *reason))
                }
                PairingEffect::Fallback { .. } => None,
            })
            .collect()
    }

    fn ctx(agents: &AgentStore) -> MatchContext<'_> {
        MatchContext { agents, tick: 1, enable_resource_claiming: true }
    }

    #[test]
    fn mutual_tops_pair_by_consent() {
        let agents = store(2);
        let search = outcome(vec![(0, vec![partner(1, 2.0)]), (1, vec![partner(0, 1.0)])]);
        let effects = find_matches(&search, &ctx(&agents));
        assert_eq!(pairs(&effects), vec![(0, 1, PairingReason::MutualConsent)]);
    }

    #[test]
    fn greedy_pass_pairs_best_remaining_score() {
        // 0 wants 1, 1 wants 2, 2 wants 0: no mutual tops.
        let agents = store(3);
        let search = outcome(vec![
            (0, vec![partner(1, 3.0), partner(2, 1.0)]),
            (1, vec![partner(2, 5.0), partner(0, 2.0)]),
            (2, vec![partner(0, 4.0), partner(1, 0.5)]),
        ]);
        let effects = find_matches(&search, &ctx(&agents));
        assert_eq!(pairs(&effects), vec![(1, 2, PairingReason::GreedyFallback)]);
        assert!(effects.contains(&PairingEffect::Fallback {
            agent: AgentId::new(0),
            resource: None,
        }));
    }

    #[test]
    fn greedy_pass_pairs_agent_whose_top_is_a_cell() {
        let agents = store(2);
        let search = outcome(vec![
            (0, vec![partner(1, 3.0)]),
            (1, vec![cell(4, 3.5), partner(0, 2.0)]),
        ]);
        let effects = find_matches(&search, &ctx(&agents));
        assert_eq!(pairs(&effects), vec![(0, 1, PairingReason::GreedyFallback)]);
        assert!(!effects.iter().any(|e| matches!(e, PairingEffect::Fallback { .. })));
    }

    #[test]
    fn paired_agent_releases_its_claimed_cell() {
        // 1 claimed (4,0) in pass 1 but is paired with 0 in pass 3; 2 wants
        // 3, which is cooling down, and falls back to the released cell.
        let mut agents = store(4);
        agents.get_mut(AgentId::new(2)).unwrap().cooldowns.insert(AgentId::new(3), 9);
        let mut search = outcome(vec![
            (0, vec![partner(1, 3.0)]),
            (1, vec![cell(4, 3.5), partner(0, 2.0)]),
            (2, vec![partner(3, 5.0), cell(4, 1.0)]),
            (3, vec![cell(6, 2.0)]),
        ]);
        search.claimed.insert(Position::new(4, 0));
        search.claimed.insert(Position::new(6, 0));
        let effects = find_matches(&search, &ctx(&agents));
        assert_eq!(pairs(&effects), vec![(0, 1, PairingReason::GreedyFallback)]);
        assert!(effects.contains(&PairingEffect::Fallback {
            agent: AgentId::new(2),
            resource: Some(Position::new(4, 0)),
        }));
    }

    #[test]
    fn equal_scores_break_ties_on_pair_key() {
        let agents = store(4);
        let search = outcome(vec![
            (0, vec![partner(3, 1.0)]),
            (1, vec![partner(2, 1.0)]),
            (2, vec![partner(0, 1.0)]),
            (3, vec![partner(1, 1.0)]),
        ]);
        let effects = find_matches(&search, &ctx(&agents));
        // Keys in order: (0,2), (0,3), (1,2), (1,3).
        assert_eq!(
            pairs(&effects),
            vec![
                (0, 2, PairingReason::GreedyFallback),
                (1, 3, PairingReason::GreedyFallback)
            ]
        );
    }

    #[test]
    fn cooldown_blocks_pairing() {
        let mut agents = store(2);
        agents.get_mut(AgentId::new(0)).unwrap().cooldowns.insert(AgentId::new(1), 5);
        let search = outcome(vec![(0, vec![partner(1, 2.0)]), (1, vec![partner(0, 2.0)])]);
        let effects = find_matches(&search, &ctx(&agents));
        assert!(pairs(&effects).is_empty());
    }

    #[test]
    fn fallback_takes_best_unclaimed_cell() {
        // 2 is cooling down against both suitors, so neither can pair.
        let mut agents = store(3);
        let cooling = &mut agents.get_mut(AgentId::new(2)).unwrap().cooldowns;
        cooling.insert(AgentId::new(0), 9);
        cooling.insert(AgentId::new(1), 9);
        let mut search = outcome(vec![
            (0, vec![partner(2, 3.0), cell(1, 1.0), cell(2, 0.5)]),
            (1, vec![partner(2, 3.0), cell(1, 1.0)]),
            (2, vec![cell(7, 9.0)]),
        ]);
        search.claimed.insert(Position::new(7, 0));
        let effects = find_matches(&search, &ctx(&agents));
        assert!(effects.contains(&PairingEffect::Fallback {
            agent: AgentId::new(0),
            resource: Some(Position::new(1, 0)),
        }));
        assert!(effects.contains(&PairingEffect::Fallback {
            agent: AgentId::new(1),
            resource: None,
        }));
    }
}
