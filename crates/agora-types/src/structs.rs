//! Core entity structs for the Agora simulation.
//!
//! Positions, inventories and signed inventory deltas, targets, resource
//! cells, ranked preference entries, and the records produced for the
//! telemetry collaborator (trades and pairing events).

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::enums::{Good, PairType, PairingReason, UnpairReason};
use crate::ids::AgentId;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// An integer grid coordinate.
///
/// Ordered by `(x, y)`, which is the tie-break order for resource
/// candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// Create a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Holdings of good A, good B and money. Non-negative by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    /// Units of good A.
    pub a: u32,
    /// Units of good B.
    pub b: u32,
    /// Units of money.
    #[serde(default)]
    pub m: u32,
}

impl Inventory {
    /// Create an inventory.
    pub const fn new(a: u32, b: u32, m: u32) -> Self {
        Self { a, b, m }
    }

    /// Quantity held of one good.
    pub const fn get(&self, good: Good) -> u32 {
        match good {
            Good::A => self.a,
            Good::B => self.b,
            Good::Money => self.m,
        }
    }

    /// Apply a signed delta, returning `None` if any quantity would go
    /// negative or overflow.
    pub fn apply(&self, delta: &InventoryDelta) -> Option<Self> {
        Some(Self {
            a: offset(self.a, delta.a)?,
            b: offset(self.b, delta.b)?,
            m: offset(self.m, delta.m)?,
        })
    }
}

/// Add a signed offset to a non-negative quantity, checked both ways.
fn offset(quantity: u32, delta: i64) -> Option<u32> {
    let shifted = i64::from(quantity).checked_add(delta)?;
    u32::try_from(shifted).ok()
}

/// A signed change to an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryDelta {
    /// Change in good A.
    pub a: i64,
    /// Change in good B.
    pub b: i64,
    /// Change in money.
    pub m: i64,
}

impl InventoryDelta {
    /// The empty delta.
    pub const ZERO: Self = Self { a: 0, b: 0, m: 0 };

    /// Delta that changes only one good.
    pub const fn single(good: Good, amount: i64) -> Self {
        match good {
            Good::A => Self { a: amount, b: 0, m: 0 },
            Good::B => Self { a: 0, b: amount, m: 0 },
            Good::Money => Self { a: 0, b: 0, m: amount },
        }
    }

    /// Change in one good.
    pub const fn get(&self, good: Good) -> i64 {
        match good {
            Good::A => self.a,
            Good::B => self.b,
            Good::Money => self.m,
        }
    }

    /// Component-wise sum, `None` on overflow.
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        Some(Self {
            a: self.a.checked_add(other.a)?,
            b: self.b.checked_add(other.b)?,
            m: self.m.checked_add(other.m)?,
        })
    }

    /// Component-wise negation, `None` on overflow.
    pub fn checked_neg(&self) -> Option<Self> {
        Some(Self {
            a: self.a.checked_neg()?,
            b: self.b.checked_neg()?,
            m: self.m.checked_neg()?,
        })
    }

    /// Whether every component is zero.
    pub const fn is_zero(&self) -> bool {
        self.a == 0 && self.b == 0 && self.m == 0
    }
}

// ---------------------------------------------------------------------------
// Targets and resource cells
// ---------------------------------------------------------------------------

/// Where an agent is heading this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    /// Move toward another agent.
    Agent {
        /// The agent being approached.
        id: AgentId,
        /// Its position when the target was chosen.
        position: Position,
    },
    /// Move toward a resource cell.
    Resource {
        /// The cell position.
        position: Position,
    },
}

impl Target {
    /// The position being approached.
    pub const fn position(&self) -> Position {
        match self {
            Self::Agent { position, .. } | Self::Resource { position } => *position,
        }
    }
}

/// A harvestable resource cell on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCell {
    /// Cell position.
    pub position: Position,
    /// The good that grows here (A or B).
    pub good: Good,
    /// Units currently available.
    pub available: u32,
    /// Units regrown per tick.
    pub regen_per_tick: u32,
    /// Ceiling for `available`.
    pub max_capacity: u32,
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Something an agent can rank: a partner or a resource cell.
///
/// Ordered agents first (by id), then resources (by position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Candidate {
    /// A potential trading partner.
    Agent(AgentId),
    /// A resource cell.
    Resource(Position),
}

impl Candidate {
    /// The partner id, if this candidate is an agent.
    pub const fn agent(&self) -> Option<AgentId> {
        match self {
            Self::Agent(id) => Some(*id),
            Self::Resource(_) => None,
        }
    }
}

/// One ranked entry in an agent's per-tick preference list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    /// The ranked candidate.
    pub candidate: Candidate,
    /// Raw surplus estimate (price overlap or utility gain).
    pub surplus: f64,
    /// `surplus * beta^distance`.
    pub discounted: f64,
    /// Manhattan distance to the candidate.
    pub distance: u32,
    /// The best pair type for partner candidates.
    pub pair_type: Option<PairType>,
}

impl PreferenceEntry {
    /// Ranking order: descending discounted score, then ascending candidate,
    /// then ascending pair-type priority.
    pub fn ranking_cmp(&self, other: &Self) -> Ordering {
        other
            .discounted
            .total_cmp(&self.discounted)
            .then_with(|| self.candidate.cmp(&other.candidate))
            .then_with(|| pair_priority(self.pair_type).cmp(&pair_priority(other.pair_type)))
    }
}

/// Priority of an optional pair type; resources sort after every pair.
fn pair_priority(pair: Option<PairType>) -> u8 {
    pair.map_or(u8::MAX, PairType::priority)
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An executed trade, as handed to telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Tick of execution.
    pub tick: u64,
    /// Agent receiving the sold good.
    pub buyer: AgentId,
    /// Agent handing over the sold good.
    pub seller: AgentId,
    /// Exchange pair.
    pub pair_type: PairType,
    /// Units of the sold good.
    pub quantity: u32,
    /// Units of the numeraire paid.
    pub payment: u32,
    /// Effective unit price (`payment / quantity`).
    pub price: f64,
    /// Signed change to the buyer's inventory.
    pub buyer_delta: InventoryDelta,
    /// Signed change to the seller's inventory.
    pub seller_delta: InventoryDelta,
    /// Buyer's utility gain.
    pub buyer_surplus: f64,
    /// Seller's utility gain.
    pub seller_surplus: f64,
}

/// What happened to a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "reason", rename_all = "snake_case")]
pub enum PairingEventKind {
    /// The pair was committed.
    Paired(PairingReason),
    /// The pair was dissolved.
    Unpaired(UnpairReason),
}

/// A pairing or unpairing, as handed to telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingEvent {
    /// Tick of the event.
    pub tick: u64,
    /// Lower agent id of the pair.
    pub first: AgentId,
    /// Higher agent id of the pair.
    pub second: AgentId,
    /// What happened.
    pub kind: PairingEventKind,
}

impl PairingEvent {
    /// Build an event with the pair in canonical order.
    pub fn new(tick: u64, a: AgentId, b: AgentId, kind: PairingEventKind) -> Self {
        let (first, second) = crate::ids::pair_key(a, b);
        Self {
            tick,
            first,
            second,
            kind,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance() {
        let p = Position::new(1, -2);
        assert_eq!(p.manhattan(Position::new(4, 2)), 7);
        assert_eq!(p.manhattan(p), 0);
    }

    #[test]
    fn inventory_apply_rejects_negative() {
        let inv = Inventory::new(3, 0, 5);
        let ok = inv.apply(&InventoryDelta { a: -3, b: 2, m: 0 });
        assert_eq!(ok, Some(Inventory::new(0, 2, 5)));
        assert!(inv.apply(&InventoryDelta::single(Good::B, -1)).is_none());
    }

    #[test]
    fn opposite_deltas_cancel() {
        let d = InventoryDelta { a: 2, b: -3, m: 0 };
        let neg = d.checked_neg().unwrap();
        assert_eq!(neg, InventoryDelta { a: -2, b: 3, m: 0 });
        assert!(d.checked_add(&neg).unwrap().is_zero());
    }

    #[test]
    fn preferences_sort_by_score_then_id() {
        let entry = |id: u32, discounted: f64| PreferenceEntry {
            candidate: Candidate::Agent(AgentId::new(id)),
            surplus: discounted,
            discounted,
            distance: 1,
            pair_type: Some(PairType::AForB),
        };
        let mut list = vec![entry(5, 1.0), entry(2, 3.0), entry(1, 1.0)];
        list.sort_by(PreferenceEntry::ranking_cmp);
        let ids: Vec<_> = list.iter().filter_map(|e| e.candidate.agent()).collect();
        assert_eq!(ids, vec![AgentId::new(2), AgentId::new(1), AgentId::new(5)]);
    }

    #[test]
    fn agents_rank_ahead_of_resources_on_ties() {
        let agent = PreferenceEntry {
            candidate: Candidate::Agent(AgentId::new(100)),
            surplus: 1.0,
            discounted: 1.0,
            distance: 2,
            pair_type: Some(PairType::AForB),
        };
        let cell = PreferenceEntry {
            candidate: Candidate::Resource(Position::new(0, 0)),
            surplus: 1.0,
            discounted: 1.0,
            distance: 2,
            pair_type: None,
        };
        assert_eq!(agent.ranking_cmp(&cell), Ordering::Less);
    }

    #[test]
    fn pairing_event_orders_ids() {
        let ev = PairingEvent::new(
            3,
            AgentId::new(8),
            AgentId::new(2),
            PairingEventKind::Paired(PairingReason::MutualConsent),
        );
        assert_eq!(ev.first, AgentId::new(2));
        assert_eq!(ev.second, AgentId::new(8));
    }
}
