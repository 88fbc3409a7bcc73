//! Housekeeping phase: quote refresh, cooldown pruning and the pairing
//! integrity check.

use agora_agents::{AgentStore, QuoteParams};
use agora_types::{AgentId, ExchangeRegime, PairingEvent, PairingEventKind, UnpairReason};
use tracing::{debug, error};

/// Regenerate quotes for every agent whose inventory changed, in ascending
/// id order. Returns the number of agents refreshed.
pub fn refresh_stale_quotes(
    agents: &mut AgentStore,
    regime: ExchangeRegime,
    params: &QuoteParams,
) -> usize {
    let mut refreshed: usize = 0;
    for agent in agents.iter_mut().filter(|agent| agent.quotes_stale) {
        agent.refresh_quotes(regime, params);
        refreshed = refreshed.saturating_add(1);
    }
    if refreshed > 0 {
        debug!(refreshed, "Stale quotes regenerated");
    }
    refreshed
}

/// Drop every cooldown that can no longer block a pairing after `tick`.
/// Returns the number of entries removed.
pub fn prune_expired_cooldowns(agents: &mut AgentStore, tick: u64) -> usize {
    let pruned = agents
        .iter_mut()
        .map(|agent| agent.prune_cooldowns(tick))
        .fold(0_usize, usize::saturating_add);
    if pruned > 0 {
        debug!(tick, pruned, "Expired cooldowns pruned");
    }
    pruned
}

/// Agents whose pairing is not reciprocated: the partner is missing, is
/// the agent itself, or is paired with someone else.
fn asymmetric_pairings(agents: &AgentStore) -> Vec<(AgentId, AgentId)> {
    agents
        .iter()
        .filter_map(|agent| {
            let partner = agent.paired_with?;
            let reciprocated = partner != agent.id
                && agents
                    .get(partner)
                    .is_some_and(|other| other.paired_with == Some(agent.id));
            (!reciprocated).then_some((agent.id, partner))
        })
        .collect()
}

/// Detect and repair asymmetric or dangling pairings.
///
/// Each anomaly is cleared on both sides, logged at error level and
/// returned as an `IntegrityRepair` unpairing event.
pub fn check_pairing_integrity(agents: &mut AgentStore, tick: u64) -> Vec<PairingEvent> {
    let mut events = Vec::new();
    for (id, partner) in asymmetric_pairings(agents) {
        error!(tick, agent_id = %id, partner = %partner, "Asymmetric pairing repaired");
        agents.unpair(id, partner);
        if let Some(agent) = agents.get_mut(id) {
            agent.paired_with = None;
            agent.target = None;
        }
        events.push(PairingEvent::new(
            tick,
            id,
            partner,
            PairingEventKind::Unpaired(UnpairReason::IntegrityRepair),
        ));
    }
    events
}
