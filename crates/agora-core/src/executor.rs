//! Trade execution and failure handling.
//!
//! Execution validates a proposal completely before touching any state:
//! per-good deltas must sum to zero and neither inventory may go negative.
//! A violation is a defect in the proposing code, so it is surfaced as a
//! fatal [`ExecutionError`] and never clamped away.

use agora_agents::{AgentError, AgentStore, inventory};
use agora_types::{AgentId, Good, Inventory, InventoryDelta, TradeRecord};
use tracing::{error, info};

use crate::bargaining::TradeProposal;

/// Errors raised while applying a trade.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The two deltas do not cancel for some good.
    #[error("conservation violated for {good:?}: deltas sum to {sum}")]
    ConservationViolation {
        /// The unbalanced good.
        good: Good,
        /// The non-zero sum.
        sum: i64,
    },

    /// A delta would leave an agent with a negative holding.
    #[error("trade would leave agent {agent_id} with negative {good:?}")]
    NegativeInventory {
        /// The agent.
        agent_id: AgentId,
        /// The good that would go negative.
        good: Good,
    },

    /// A party to the trade is missing from the store.
    #[error("trade party not found: {0}")]
    AgentNotFound(AgentId),

    /// Buyer and seller are the same agent.
    #[error("agent {0} cannot trade with itself")]
    SelfTrade(AgentId),

    /// A holding would overflow.
    #[error("trade would overflow agent {0}'s inventory")]
    Overflow(AgentId),
}

/// Validate and apply a proposal, returning the record for telemetry.
///
/// Both agents' quotes are marked stale.
///
/// # Errors
///
/// Returns [`ExecutionError`] if the proposal fails validation; the store
/// is left untouched in that case.
pub fn execute_trade(
    agents: &mut AgentStore,
    proposal: &TradeProposal,
    tick: u64,
) -> Result<TradeRecord, ExecutionError> {
    let result = validate_and_apply(agents, proposal);
    match result {
        Ok(()) => {
            info!(
                tick,
                seller = %proposal.seller,
                buyer = %proposal.buyer,
                pair = %proposal.pair_type,
                quantity = proposal.quantity,
                payment = proposal.payment,
                "Trade executed"
            );
            Ok(TradeRecord {
                tick,
                buyer: proposal.buyer,
                seller: proposal.seller,
                pair_type: proposal.pair_type,
                quantity: proposal.quantity,
                payment: proposal.payment,
                price: proposal.price,
                buyer_delta: proposal.buyer_delta,
                seller_delta: proposal.seller_delta,
                buyer_surplus: proposal.buyer_surplus,
                seller_surplus: proposal.seller_surplus,
            })
        }
        Err(err) => {
            error!(
                tick,
                seller = %proposal.seller,
                buyer = %proposal.buyer,
                %err,
                "Trade rejected"
            );
            Err(err)
        }
    }
}

fn validate_and_apply(
    agents: &mut AgentStore,
    proposal: &TradeProposal,
) -> Result<(), ExecutionError> {
    if proposal.buyer == proposal.seller {
        return Err(ExecutionError::SelfTrade(proposal.buyer));
    }
    for good in [Good::A, Good::B, Good::Money] {
        let sum = proposal
            .buyer_delta
            .get(good)
            .checked_add(proposal.seller_delta.get(good))
            .unwrap_or(i64::MAX);
        if sum != 0 {
            return Err(ExecutionError::ConservationViolation { good, sum });
        }
    }

    let buyer_after = next_inventory(agents, proposal.buyer, &proposal.buyer_delta)?;
    let seller_after = next_inventory(agents, proposal.seller, &proposal.seller_delta)?;

    for (id, after) in [(proposal.buyer, buyer_after), (proposal.seller, seller_after)] {
        let agent = agents.get_mut(id).ok_or(ExecutionError::AgentNotFound(id))?;
        agent.inventory = after;
        agent.quotes_stale = true;
    }
    Ok(())
}

fn next_inventory(
    agents: &AgentStore,
    id: AgentId,
    delta: &InventoryDelta,
) -> Result<Inventory, ExecutionError> {
    let agent = agents.get(id).ok_or(ExecutionError::AgentNotFound(id))?;
    inventory::checked_apply(&agent.inventory, delta).map_err(|err| match err {
        AgentError::InsufficientHolding { good, .. } => {
            ExecutionError::NegativeInventory { agent_id: id, good }
        }
        _ => ExecutionError::Overflow(id),
    })
}

/// Dissolve a pair after a failed match and bar re-pairing for
/// `cooldown_ticks` ticks on both sides.
///
/// Re-pairing is allowed again from tick `tick + cooldown_ticks`.
pub fn unpair_with_cooldown(
    agents: &mut AgentStore,
    a: AgentId,
    b: AgentId,
    tick: u64,
    cooldown_ticks: u64,
) {
    agents.unpair(a, b);
    let until = tick.saturating_add(cooldown_ticks);
    for (id, partner) in [(a, b), (b, a)] {
        if let Some(agent) = agents.get_mut(id) {
            agent.cooldowns.insert(partner, until);
        }
    }
}
