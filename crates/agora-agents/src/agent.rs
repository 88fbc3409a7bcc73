//! Agent state and the agent store.
//!
//! The [`AgentStore`] is the only cross-tick mutable state for agents. It is
//! an ordered map, so every iteration over agents runs in ascending id
//! order. Pairing is kept bidirectional by only ever pairing or unpairing
//! through the store.

use std::collections::BTreeMap;

use agora_types::{AgentId, ExchangeRegime, Inventory, Position, QuoteSet, Target};
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::quotes::{QuoteParams, generate_quotes};
use crate::utility::{Utility, UtilityForm};

/// One trading agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique id.
    pub id: AgentId,
    /// Grid position.
    pub position: Position,
    /// Holdings of A, B and money.
    pub inventory: Inventory,
    /// Utility over goods.
    pub utility: UtilityForm,
    /// Marginal utility of money.
    pub lambda_money: f64,
    /// Posted quotes.
    pub quotes: QuoteSet,
    /// Set when the inventory changed since quotes were last generated.
    pub quotes_stale: bool,
    /// Committed trading partner.
    pub paired_with: Option<AgentId>,
    /// Current movement target.
    pub target: Option<Target>,
    /// Partner id to the first tick at which re-pairing is allowed.
    pub cooldowns: BTreeMap<AgentId, u64>,
}

impl Agent {
    /// Create an unpaired agent with no quotes yet.
    pub const fn new(
        id: AgentId,
        position: Position,
        inventory: Inventory,
        utility: UtilityForm,
        lambda_money: f64,
    ) -> Self {
        Self {
            id,
            position,
            inventory,
            utility,
            lambda_money,
            quotes: QuoteSet::new(),
            quotes_stale: true,
            paired_with: None,
            target: None,
            cooldowns: BTreeMap::new(),
        }
    }

    /// Borrow the utility capability.
    pub fn utility(&self) -> &dyn Utility {
        self.utility.as_utility()
    }

    /// Utility of the current holdings of goods.
    pub fn goods_utility(&self) -> f64 {
        self.utility
            .utility_of_goods(f64::from(self.inventory.a), f64::from(self.inventory.b))
    }

    /// Whether the agent is committed to a partner.
    pub const fn is_paired(&self) -> bool {
        self.paired_with.is_some()
    }

    /// Whether this agent's cooldown against `partner` is active at `tick`.
    pub fn has_cooldown(&self, partner: AgentId, tick: u64) -> bool {
        self.cooldowns
            .get(&partner)
            .is_some_and(|until| tick < *until)
    }

    /// Drop cooldowns that expired at or before `tick`. Returns how many
    /// were dropped.
    pub fn prune_cooldowns(&mut self, tick: u64) -> usize {
        let before = self.cooldowns.len();
        self.cooldowns.retain(|_, until| *until > tick);
        before.saturating_sub(self.cooldowns.len())
    }

    /// Regenerate quotes from the current inventory and clear the stale flag.
    pub fn refresh_quotes(&mut self, regime: ExchangeRegime, params: &QuoteParams) {
        self.quotes = generate_quotes(
            &self.inventory,
            self.utility.as_utility(),
            self.lambda_money,
            regime,
            params,
        );
        self.quotes_stale = false;
    }
}

/// Ordered collection of every agent in the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentStore {
    agents: BTreeMap<AgentId, Agent>,
}

impl AgentStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            agents: BTreeMap::new(),
        }
    }

    /// Add an agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateAgent`] if the id is already taken.
    pub fn insert(&mut self, agent: Agent) -> Result<(), AgentError> {
        if self.agents.contains_key(&agent.id) {
            return Err(AgentError::DuplicateAgent(agent.id));
        }
        self.agents.insert(agent.id, agent);
        Ok(())
    }

    /// Borrow an agent.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Mutably borrow an agent.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// Borrow an agent or fail with [`AgentError::AgentNotFound`].
    pub fn require(&self, id: AgentId) -> Result<&Agent, AgentError> {
        self.agents.get(&id).ok_or(AgentError::AgentNotFound(id))
    }

    /// Mutably borrow an agent or fail with [`AgentError::AgentNotFound`].
    pub fn require_mut(&mut self, id: AgentId) -> Result<&mut Agent, AgentError> {
        self.agents.get_mut(&id).ok_or(AgentError::AgentNotFound(id))
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    /// Iterate agents in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Mutably iterate agents in ascending id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.values_mut()
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Whether either side holds an active cooldown against the other.
    pub fn cooldown_active(&self, a: AgentId, b: AgentId, tick: u64) -> bool {
        self.get(a).is_some_and(|agent| agent.has_cooldown(b, tick))
            || self.get(b).is_some_and(|agent| agent.has_cooldown(a, tick))
    }

    /// Commit `a` and `b` to each other and clear their mutual cooldowns.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if either id is unknown. On
    /// error nothing is mutated.
    pub fn pair(&mut self, a: AgentId, b: AgentId) -> Result<(), AgentError> {
        self.require(a)?;
        self.require(b)?;
        let first = self.require_mut(a)?;
        first.paired_with = Some(b);
        first.cooldowns.remove(&b);
        let second = self.require_mut(b)?;
        second.paired_with = Some(a);
        second.cooldowns.remove(&a);
        Ok(())
    }

    /// Clear the pairing on both sides. Unknown ids are ignored.
    pub fn unpair(&mut self, a: AgentId, b: AgentId) {
        for (id, partner) in [(a, b), (b, a)] {
            if let Some(agent) = self.agents.get_mut(&id) {
                if agent.paired_with == Some(partner) {
                    agent.paired_with = None;
                }
            }
        }
    }

    /// Pairs as `(min id, max id)`, ascending, each listed once.
    ///
    /// Only symmetric pairings are listed.
    pub fn pairs(&self) -> Vec<(AgentId, AgentId)> {
        self.agents
            .values()
            .filter_map(|agent| {
                let partner = agent.paired_with?;
                let back = self.get(partner)?.paired_with;
                (agent.id < partner && back == Some(agent.id)).then_some((agent.id, partner))
            })
            .collect()
    }
}
