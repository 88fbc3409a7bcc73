//! Error types for the `agora-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`].

use agora_types::{Good, Position};

/// Errors that can occur during grid and resource operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A position lies outside the grid.
    #[error("position {position} outside {width}x{height} grid")]
    OutOfBounds {
        /// The rejected position.
        position: Position,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },

    /// A resource cell already exists at the position.
    #[error("duplicate resource cell at {0}")]
    DuplicateResource(Position),

    /// Resource cells grow goods A or B, never money.
    #[error("resource cells cannot hold {0:?}")]
    InvalidResourceGood(Good),

    /// The grid has a zero dimension.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid {
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },

    /// Checked arithmetic failed.
    #[error("arithmetic overflow in world computation")]
    ArithmeticOverflow,
}
