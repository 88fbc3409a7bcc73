//! Tick cycle: the eight-phase loop that drives the exchange simulation.
//!
//! Each tick runs these phases in a fixed order:
//!
//! 1. **Wake** -- advance the clock and derive the tick mode. A tick that
//!    forbids trading dissolves every pair.
//! 2. **Perception** -- build a frozen snapshot per agent.
//! 3. **Decision** -- search (pass 1), then matching (passes 2 and 3).
//!    Targets and pairings are applied here and nowhere else.
//! 4. **Movement** -- agents step toward their targets.
//! 5. **Trade** -- every pair within interaction range negotiates once; a
//!    failed negotiation dissolves the pair and starts a cooldown.
//! 6. **Forage** -- unpaired agents harvest the cell they stand on.
//! 7. **Regeneration** -- resource cells regrow.
//! 8. **Housekeeping** -- stale quotes are regenerated, expired cooldowns
//!    are dropped and pairings are checked for symmetry.
//!
//! The cycle draws no randomness: the same state yields the same tick.

use agora_agents::AgentStore;
use agora_types::{
    AgentId, Candidate, PairingEvent, PairingEventKind, TickMode, Target, TradeRecord, UnpairReason,
};
use agora_world::{Grid, SpatialIndex};
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::WorldClock;
use crate::config::ScenarioParams;
use crate::executor::{self, ExecutionError};
use crate::forage;
use crate::housekeeping;
use crate::matching::{MatchContext, PairingEffect};
use crate::movement::{self, MoveRules};
use crate::perception::{self, PerceptionContext};
use crate::protocol::Protocols;
use crate::search;
use crate::telemetry::TelemetrySink;

/// Errors that abort a tick.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: crate::clock::ClockError,
    },

    /// An agent operation failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: agora_agents::AgentError,
    },

    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: agora_world::WorldError,
    },

    /// A trade failed validation.
    #[error("execution error: {source}")]
    Execution {
        /// The underlying execution error.
        #[from]
        source: ExecutionError,
    },
}

/// Summary of a single tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    /// The tick that ran.
    pub tick: u64,
    /// Activities permitted during the tick.
    pub mode: TickMode,
    /// Trades executed, in pair order.
    pub trades: Vec<TradeRecord>,
    /// Pairings and unpairings, in emission order.
    pub pairing_events: Vec<PairingEvent>,
    /// Pairs still committed at the end of the tick.
    pub active_pairs: usize,
    /// Units harvested during forage.
    pub harvested: u64,
    /// Units regrown during regeneration.
    pub regenerated: u64,
    /// Pairings repaired by the integrity check.
    pub integrity_repairs: usize,
    /// Pairs dissolved because no mutually improving trade existed.
    pub failed_matches: usize,
}

/// The mutable simulation state passed through the tick cycle.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// The world clock.
    pub clock: WorldClock,
    /// The grid and its resource cells.
    pub grid: Grid,
    /// Agent positions, bucketed for radius queries.
    pub index: SpatialIndex,
    /// Every agent, keyed by id.
    pub agents: AgentStore,
    /// Scenario parameters.
    pub params: ScenarioParams,
}

/// Execute one complete tick.
///
/// Trades and pairing events are handed to `sink` as they happen; the
/// returned summary repeats them.
///
/// # Errors
///
/// Returns [`TickError`] if the clock overflows, an inventory or cell update
/// overflows, or a trade fails validation. A failed validation is a defect,
/// not a negotiation outcome.
pub fn run_tick(
    state: &mut SimulationState,
    protocols: &Protocols,
    sink: &mut dyn TelemetrySink,
) -> Result<TickSummary, TickError> {
    let mut events: Vec<PairingEvent> = Vec::new();

    // --- Phase 1: Wake ---
    state.clock.advance()?;
    let tick = state.clock.tick();
    let mode = state.clock.mode();
    info!(tick, ?mode, "Tick started");
    if !mode.allows_trade() {
        phase_dissolve_pairs(&mut state.agents, tick, &mut events);
    }

    // --- Phase 2 + 3: Perception and Decision ---
    phase_decision(state, protocols, tick, mode, &mut events)?;

    // --- Phase 4: Movement ---
    let rules = MoveRules {
        budget: state.params.move_budget_per_tick,
        interaction_radius: state.params.interaction_radius,
    };
    movement::move_agents(&mut state.agents, &mut state.index, &state.grid, rules);

    // --- Phase 5: Trade ---
    let (trades, failed_matches) = if mode.allows_trade() {
        phase_trade(state, protocols, tick, &mut events, sink)?
    } else {
        (Vec::new(), 0)
    };

    // --- Phase 6: Forage ---
    let harvested = if mode.allows_forage() {
        forage::forage(&mut state.agents, &mut state.grid, tick, state.params.forage_rate)?
    } else {
        0
    };

    // --- Phase 7: Regeneration ---
    let regenerated = state.grid.regenerate_all()?;

    // --- Phase 8: Housekeeping ---
    housekeeping::refresh_stale_quotes(
        &mut state.agents,
        state.params.exchange_regime,
        &state.params.quote_params(),
    );
    housekeeping::prune_expired_cooldowns(&mut state.agents, tick);
    let repairs = housekeeping::check_pairing_integrity(&mut state.agents, tick);
    let integrity_repairs = repairs.len();
    events.extend(repairs);

    for event in &events {
        sink.record_pairing(event);
    }

    let active_pairs = state.agents.pairs().len();
    info!(
        tick,
        trades = trades.len(),
        active_pairs,
        failed_matches,
        harvested,
        "Tick completed"
    );

    Ok(TickSummary {
        tick,
        mode,
        trades,
        pairing_events: events,
        active_pairs,
        harvested,
        regenerated,
        integrity_repairs,
        failed_matches,
    })
}

/// Dissolve every committed pair when trading is not permitted.
fn phase_dissolve_pairs(agents: &mut AgentStore, tick: u64, events: &mut Vec<PairingEvent>) {
    for (a, b) in agents.pairs() {
        agents.unpair(a, b);
        clear_target(agents, a);
        clear_target(agents, b);
        debug!(tick, first = %a, second = %b, "Pair dissolved by mode change");
        events.push(PairingEvent::new(
            tick,
            a,
            b,
            PairingEventKind::Unpaired(UnpairReason::ModeChange),
        ));
    }
}

/// Perception, search and matching, then apply every effect in one place.
fn phase_decision(
    state: &mut SimulationState,
    protocols: &Protocols,
    tick: u64,
    mode: TickMode,
    events: &mut Vec<PairingEvent>,
) -> Result<(), TickError> {
    let snapshots = perception::assemble_all(&PerceptionContext {
        agents: &state.agents,
        index: &state.index,
        grid: &state.grid,
        vision_radius: state.params.vision_radius,
        tick,
        mode,
        regime: state.params.exchange_regime,
    });
    let outcome = search::run_search(
        protocols.search.as_ref(),
        &state.agents,
        &snapshots,
        &state.params,
    );
    let effects = protocols.matching.find_matches(
        &outcome,
        &MatchContext {
            agents: &state.agents,
            tick,
            enable_resource_claiming: state.params.enable_resource_claiming,
        },
    );

    // Tentative targets from pass 1.
    for (&id, list) in &outcome.preferences {
        let target = protocols
            .search
            .select_target(list)
            .and_then(|entry| match entry.candidate {
                Candidate::Resource(position) => Some(Target::Resource { position }),
                Candidate::Agent(other) => state
                    .agents
                    .get(other)
                    .map(|a| Target::Agent {
                        id: other,
                        position: a.position,
                    }),
            });
        if let Some(agent) = state.agents.get_mut(id) {
            agent.target = target;
        }
    }

    for effect in effects {
        match effect {
            PairingEffect::Pair {
                first,
                second,
                reason,
            } => {
                state.agents.pair(first, second)?;
                debug!(tick, first = %first, second = %second, ?reason, "Pair committed");
                events.push(PairingEvent::new(
                    tick,
                    first,
                    second,
                    PairingEventKind::Paired(reason),
                ));
            }
            PairingEffect::Fallback { agent, resource } => {
                if let Some(a) = state.agents.get_mut(agent) {
                    a.target = resource.map(|position| Target::Resource { position });
                }
            }
        }
    }

    // Every paired agent, new or persisting, heads for its partner.
    for (a, b) in state.agents.pairs() {
        for (id, partner) in [(a, b), (b, a)] {
            let Some(position) = state.agents.get(partner).map(|p| p.position) else {
                continue;
            };
            if let Some(agent) = state.agents.get_mut(id) {
                agent.target = Some(Target::Agent {
                    id: partner,
                    position,
                });
            }
        }
    }
    Ok(())
}

/// Negotiate once per pair within interaction range, in ascending pair
/// order. Returns the executed trades and the number of failed matches.
fn phase_trade(
    state: &mut SimulationState,
    protocols: &Protocols,
    tick: u64,
    events: &mut Vec<PairingEvent>,
    sink: &mut dyn TelemetrySink,
) -> Result<(Vec<TradeRecord>, usize), TickError> {
    let mut trades = Vec::new();
    let mut failed: usize = 0;
    for (a, b) in state.agents.pairs() {
        let (Some(first), Some(second)) = (state.agents.get(a), state.agents.get(b)) else {
            continue;
        };
        if first.position.manhattan(second.position) > state.params.interaction_radius {
            continue;
        }
        match protocols.bargaining.propose_trade(first, second, &state.params) {
            Some(proposal) => {
                let record = executor::execute_trade(&mut state.agents, &proposal, tick)?;
                sink.record_trade(&record);
                trades.push(record);
            }
            None => {
                executor::unpair_with_cooldown(
                    &mut state.agents,
                    a,
                    b,
                    tick,
                    state.params.trade_cooldown_ticks,
                );
                clear_target(&mut state.agents, a);
                clear_target(&mut state.agents, b);
                failed = failed.saturating_add(1);
                info!(
                    tick,
                    first = %a,
                    second = %b,
                    cooldown = state.params.trade_cooldown_ticks,
                    "No mutually improving trade; pair dissolved"
                );
                events.push(PairingEvent::new(
                    tick,
                    a,
                    b,
                    PairingEventKind::Unpaired(UnpairReason::TradeFailed),
                ));
            }
        }
    }
    Ok((trades, failed))
}

fn clear_target(agents: &mut AgentStore, id: AgentId) {
    if let Some(agent) = agents.get_mut(id) {
        agent.target = None;
    }
}
