//! Agent state, utility, and quoting for the Agora exchange simulation.
//!
//! This crate contains the logic layer for agents -- everything that operates
//! on agent state without touching I/O. It sits between `agora-types`
//! (which defines the shared data) and `agora-core` (which orchestrates the
//! tick).
//!
//! # Modules
//!
//! - [`agent`] -- Agent state and the ordered [`AgentStore`]
//! - [`error`] -- Error types for all agent operations ([`AgentError`])
//! - [`inventory`] -- Checked inventory operations
//! - [`quotes`] -- Reservation prices and quote generation
//! - [`utility`] -- The [`Utility`] capability and concrete forms

pub mod agent;
pub mod error;
pub mod inventory;
pub mod quotes;
pub mod utility;

// Re-export primary types at crate root for convenience.
pub use agent::{Agent, AgentStore};
pub use error::AgentError;
pub use quotes::{QuoteParams, filter_quotes, generate_quotes, reservation_price};
pub use utility::{Ces, Linear, Quadratic, Utility, UtilityForm};
