//! Grid, spatial index, and resource cells for the Agora exchange
//! simulation.
//!
//! # Modules
//!
//! - [`error`] -- Error types for world operations ([`WorldError`])
//! - [`grid`] -- The bounded [`Grid`] and its resource cells
//! - [`resource`] -- Regeneration and harvest for a single cell
//! - [`spatial`] -- Bucketed [`SpatialIndex`] for radius queries

pub mod error;
pub mod grid;
pub mod resource;
pub mod spatial;

pub use error::WorldError;
pub use grid::Grid;
pub use spatial::SpatialIndex;
