//! Error types for the agora-agents crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! This module defines the error hierarchy used across the agent store,
//! utility validation, and inventory operations.

use agora_types::{AgentId, Good};

/// Errors that can occur during agent state operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Attempted to remove more of a good than the agent holds.
    #[error("insufficient holding: wanted {requested} of {good:?} but only have {available}")]
    InsufficientHolding {
        /// The good being removed.
        good: Good,
        /// The quantity the caller attempted to remove.
        requested: u32,
        /// The quantity the agent actually holds.
        available: u32,
    },

    /// An arithmetic overflow occurred during an inventory computation.
    #[error("arithmetic overflow in inventory computation: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },

    /// Agent with the given ID was not found in the store.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// An agent with the given ID is already in the store.
    #[error("duplicate agent id: {0}")]
    DuplicateAgent(AgentId),

    /// A utility function's parameters are out of range.
    #[error("invalid utility parameters: {reason}")]
    InvalidUtility {
        /// Description of the rejected parameter.
        reason: String,
    },
}
