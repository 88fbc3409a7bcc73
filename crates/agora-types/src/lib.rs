//! Shared type definitions for the Agora exchange simulation.
//!
//! This crate is the single source of truth for the data that flows between
//! the agent, world, and core crates: identifiers, goods and exchange pairs,
//! inventories, quotes, preference entries, and the records handed to
//! telemetry.
//!
//! # Modules
//!
//! - [`ids`] -- Integer id wrappers and the canonical pair key
//! - [`enums`] -- Goods, pair types, regimes, tick modes, pairing reasons
//! - [`structs`] -- Positions, inventories, targets, resource cells, records
//! - [`quotes`] -- Quote keys and quote sets
//! - [`perception`] -- Per-tick perception snapshot

pub mod enums;
pub mod ids;
pub mod perception;
pub mod quotes;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ExchangeRegime, Good, PairType, PairingReason, QuoteSide, TickMode, UnpairReason};
pub use ids::{AgentId, pair_key};
pub use perception::{PerceptionSnapshot, VisibleNeighbor, VisibleResource};
pub use quotes::{ParseQuoteKeyError, QuoteKey, QuoteSet};
pub use structs::{
    Candidate, Inventory, InventoryDelta, PairingEvent, PairingEventKind, Position,
    PreferenceEntry, ResourceCell, Target, TradeRecord,
};
