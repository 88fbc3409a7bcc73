//! Swappable decision strategies.
//!
//! The tick orchestrator never calls search, matching or bargaining
//! directly. It goes through the three traits here, bundled in
//! [`Protocols`], so an alternative strategy (a different ranking rule, a
//! stable-matching pass, a multi-round bargaining scheme) can be dropped in
//! without touching the tick cycle.

use std::collections::BTreeSet;

use agora_agents::{Agent, Utility};
use agora_types::{PerceptionSnapshot, Position, PreferenceEntry};

use crate::bargaining::{self, TradeProposal};
use crate::config::ScenarioParams;
use crate::matching::{self, MatchContext, PairingEffect};
use crate::search::{self, SearchOutcome};

/// Builds an agent's ranked preference list and picks its tentative target.
pub trait SearchProtocol {
    /// Build the sorted preference list for one agent.
    ///
    /// `claimed` holds the cells already reserved earlier in this tick.
    fn build_preferences(
        &self,
        snapshot: &PerceptionSnapshot,
        utility: &dyn Utility,
        params: &ScenarioParams,
        claimed: &BTreeSet<Position>,
    ) -> Vec<PreferenceEntry>;

    /// Pick the tentative target from a sorted list.
    fn select_target<'a>(&self, preferences: &'a [PreferenceEntry]) -> Option<&'a PreferenceEntry> {
        preferences.first()
    }
}

/// Turns preference lists into committed pairs and fallback targets.
pub trait MatchingProtocol {
    /// Compute the pairing effects for this tick. Must not mutate state.
    fn find_matches(&self, search: &SearchOutcome, ctx: &MatchContext<'_>) -> Vec<PairingEffect>;
}

/// Negotiates a single trade between two paired agents.
pub trait BargainingProtocol {
    /// Propose a mutually improving trade, or `None` if none exists.
    fn propose_trade(
        &self,
        first: &Agent,
        second: &Agent,
        params: &ScenarioParams,
    ) -> Option<TradeProposal>;
}

/// Distance-discounted surplus ranking.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceDiscountedSearch;

impl SearchProtocol for DistanceDiscountedSearch {
    fn build_preferences(
        &self,
        snapshot: &PerceptionSnapshot,
        utility: &dyn Utility,
        params: &ScenarioParams,
        claimed: &BTreeSet<Position>,
    ) -> Vec<PreferenceEntry> {
        search::build_preferences(snapshot, utility, params, claimed)
    }
}

/// Mutual consent followed by a greedy global pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreePassMatching;

impl MatchingProtocol for ThreePassMatching {
    fn find_matches(&self, search: &SearchOutcome, ctx: &MatchContext<'_>) -> Vec<PairingEffect> {
        matching::find_matches(search, ctx)
    }
}

/// Single-tick compensating-block search.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompensatingBlockBargaining;

impl BargainingProtocol for CompensatingBlockBargaining {
    fn propose_trade(
        &self,
        first: &Agent,
        second: &Agent,
        params: &ScenarioParams,
    ) -> Option<TradeProposal> {
        bargaining::propose_trade(first, second, params)
    }
}

/// The strategies used by one simulation run.
pub struct Protocols {
    /// Pass 1.
    pub search: Box<dyn SearchProtocol>,
    /// Passes 2 and 3.
    pub matching: Box<dyn MatchingProtocol>,
    /// Trade negotiation.
    pub bargaining: Box<dyn BargainingProtocol>,
}

impl Default for Protocols {
    fn default() -> Self {
        Self {
            search: Box::new(DistanceDiscountedSearch),
            matching: Box::new(ThreePassMatching),
            bargaining: Box::new(CompensatingBlockBargaining),
        }
    }
}

impl core::fmt::Debug for Protocols {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Protocols").finish_non_exhaustive()
    }
}
