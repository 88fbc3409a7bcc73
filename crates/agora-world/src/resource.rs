//! Regeneration and harvest logic for resource cells.
//!
//! Each [`ResourceCell`] has a current `available` quantity, a
//! `regen_per_tick` rate, and a `max_capacity` ceiling. Regeneration runs
//! once per tick after foraging and is capped so that `available` never
//! exceeds `max_capacity`.

use agora_types::ResourceCell;

use crate::error::WorldError;

/// Apply one tick of regeneration to a [`ResourceCell`].
///
/// Returns the number of units actually regenerated (zero if the cell is
/// already at capacity).
///
/// # Errors
///
/// Returns [`WorldError::ArithmeticOverflow`] if checked arithmetic fails.
pub fn regenerate(cell: &mut ResourceCell) -> Result<u32, WorldError> {
    if cell.available >= cell.max_capacity {
        return Ok(0);
    }

    let headroom = cell
        .max_capacity
        .checked_sub(cell.available)
        .ok_or(WorldError::ArithmeticOverflow)?;

    let added = cell.regen_per_tick.min(headroom);
    cell.available = cell
        .available
        .checked_add(added)
        .ok_or(WorldError::ArithmeticOverflow)?;

    Ok(added)
}

/// Deduct a quantity from a resource cell, returning the amount taken.
///
/// If the cell holds fewer units than requested, everything remaining is
/// taken.
///
/// # Errors
///
/// Returns [`WorldError::ArithmeticOverflow`] if checked arithmetic fails.
pub fn harvest(cell: &mut ResourceCell, requested: u32) -> Result<u32, WorldError> {
    let taken = requested.min(cell.available);
    cell.available = cell
        .available
        .checked_sub(taken)
        .ok_or(WorldError::ArithmeticOverflow)?;
    Ok(taken)
}

#[cfg(test)]
mod tests {
    use agora_types::{Good, Position};

    use super::*;

    fn make_cell(available: u32, regen: u32, max: u32) -> ResourceCell {
        ResourceCell {
            position: Position::new(0, 0),
            good: Good::A,
            available,
            regen_per_tick: regen,
            max_capacity: max,
        }
    }

    #[test]
    fn regen_adds_rate() {
        let mut cell = make_cell(4, 2, 10);
        assert_eq!(regenerate(&mut cell).ok(), Some(2));
        assert_eq!(cell.available, 6);
    }

    #[test]
    fn regen_capped_at_max() {
        let mut cell = make_cell(9, 3, 10);
        assert_eq!(regenerate(&mut cell).ok(), Some(1));
        assert_eq!(cell.available, 10);
    }

    #[test]
    fn regen_already_full() {
        let mut cell = make_cell(10, 3, 10);
        assert_eq!(regenerate(&mut cell).ok(), Some(0));
        assert_eq!(cell.available, 10);
    }

    #[test]
    fn regen_zero_rate() {
        let mut cell = make_cell(0, 0, 5);
        assert_eq!(regenerate(&mut cell).ok(), Some(0));
        assert_eq!(cell.available, 0);
    }

    #[test]
    fn harvest_full_amount() {
        let mut cell = make_cell(5, 1, 10);
        assert_eq!(harvest(&mut cell, 3).ok(), Some(3));
        assert_eq!(cell.available, 2);
    }

    #[test]
    fn harvest_partial_when_scarce() {
        let mut cell = make_cell(1, 1, 10);
        assert_eq!(harvest(&mut cell, 3).ok(), Some(1));
        assert_eq!(cell.available, 0);
    }

    #[test]
    fn harvest_empty_cell() {
        let mut cell = make_cell(0, 1, 10);
        assert_eq!(harvest(&mut cell, 3).ok(), Some(0));
    }
}
