//! The bounded grid and its resource cells.
//!
//! Cells are keyed by position in an ordered map, so visible-resource lists
//! come back sorted by `(x, y)` and regeneration runs in a fixed order.

use std::collections::BTreeMap;
use std::ops::Bound;

use agora_types::{Good, Position, ResourceCell};
use tracing::debug;

use crate::error::WorldError;
use crate::resource;

/// A `width x height` grid with coordinates in `[0, width) x [0, height)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: BTreeMap<Position, ResourceCell>,
}

impl Grid {
    /// Create an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyGrid`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        if width == 0
            || height == 0
            || i32::try_from(width).is_err()
            || i32::try_from(height).is_err()
        {
            return Err(WorldError::EmptyGrid { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: BTreeMap::new(),
        })
    }

    /// Grid width.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the position lies on the grid.
    pub fn contains(&self, pos: Position) -> bool {
        u32::try_from(pos.x).is_ok_and(|x| x < self.width)
            && u32::try_from(pos.y).is_ok_and(|y| y < self.height)
    }

    /// Nearest on-grid position.
    pub fn clamp(&self, pos: Position) -> Position {
        let max_x = i32::try_from(self.width.saturating_sub(1)).unwrap_or(i32::MAX);
        let max_y = i32::try_from(self.height.saturating_sub(1)).unwrap_or(i32::MAX);
        Position::new(pos.x.clamp(0, max_x), pos.y.clamp(0, max_y))
    }

    /// Add a resource cell.
    ///
    /// # Errors
    ///
    /// Fails if the cell is off-grid, already present, or grows money.
    pub fn add_resource(&mut self, cell: ResourceCell) -> Result<(), WorldError> {
        if !self.contains(cell.position) {
            return Err(WorldError::OutOfBounds {
                position: cell.position,
                width: self.width,
                height: self.height,
            });
        }
        if cell.good == Good::Money {
            return Err(WorldError::InvalidResourceGood(cell.good));
        }
        if self.cells.contains_key(&cell.position) {
            return Err(WorldError::DuplicateResource(cell.position));
        }
        self.cells.insert(cell.position, cell);
        Ok(())
    }

    /// The resource cell at a position.
    pub fn resource_at(&self, pos: Position) -> Option<&ResourceCell> {
        self.cells.get(&pos)
    }

    /// Mutable access to the resource cell at a position.
    pub fn resource_at_mut(&mut self, pos: Position) -> Option<&mut ResourceCell> {
        self.cells.get_mut(&pos)
    }

    /// All resource cells in position order.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceCell> {
        self.cells.values()
    }

    /// Number of resource cells.
    pub fn resource_count(&self) -> usize {
        self.cells.len()
    }

    /// Stocked cells within Manhattan distance `radius`, in position order.
    ///
    /// Only the column band `[x - radius, x + radius]` is scanned.
    pub fn stocked_within(&self, pos: Position, radius: u32) -> Vec<&ResourceCell> {
        let reach = i32::try_from(radius).unwrap_or(i32::MAX);
        let low = Position::new(pos.x.saturating_sub(reach), i32::MIN);
        let high = Position::new(pos.x.saturating_add(reach), i32::MAX);
        self.cells
            .range((Bound::Included(low), Bound::Included(high)))
            .map(|(_, cell)| cell)
            .filter(|cell| cell.available > 0 && pos.manhattan(cell.position) <= radius)
            .collect()
    }

    /// Regrow every cell once, returning the total units added.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] if checked arithmetic fails.
    pub fn regenerate_all(&mut self) -> Result<u64, WorldError> {
        let mut total: u64 = 0;
        for cell in self.cells.values_mut() {
            let added = resource::regenerate(cell)?;
            total = total
                .checked_add(u64::from(added))
                .ok_or(WorldError::ArithmeticOverflow)?;
        }
        debug!(regenerated = total, "resource regeneration complete");
        Ok(total)
    }
}
