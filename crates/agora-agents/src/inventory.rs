//! Inventory operations for agents.
//!
//! Holdings of A, B and money are unsigned, so a negative inventory cannot be
//! represented. This module provides adding, removing, and delta
//! application with full checked arithmetic -- no silent overflows, no
//! panics.

use agora_types::{Good, Inventory, InventoryDelta};

use crate::error::AgentError;

/// Check whether the inventory holds at least `amount` of the given good.
pub const fn has_good(inventory: &Inventory, good: Good, amount: u32) -> bool {
    inventory.get(good) >= amount
}

/// Mutable handle to the slot for one good.
const fn slot(inventory: &mut Inventory, good: Good) -> &mut u32 {
    match good {
        Good::A => &mut inventory.a,
        Good::B => &mut inventory.b,
        Good::Money => &mut inventory.m,
    }
}

/// Add `amount` units of `good` to the inventory.
///
/// Fails on `u32` overflow.
pub fn add_good(inventory: &mut Inventory, good: Good, amount: u32) -> Result<(), AgentError> {
    let entry = slot(inventory, good);
    *entry = entry
        .checked_add(amount)
        .ok_or_else(|| AgentError::ArithmeticOverflow {
            context: format!("adding {amount} of {good:?}"),
        })?;
    Ok(())
}

/// Remove `amount` units of `good` from the inventory.
///
/// Fails if the agent does not hold enough of the good.
pub fn remove_good(inventory: &mut Inventory, good: Good, amount: u32) -> Result<(), AgentError> {
    let entry = slot(inventory, good);
    let available = *entry;
    *entry = available
        .checked_sub(amount)
        .ok_or(AgentError::InsufficientHolding {
            good,
            requested: amount,
            available,
        })?;
    Ok(())
}

/// Compute the inventory that results from applying `delta`.
///
/// The input is left untouched; fails if any holding would go negative or
/// overflow, naming the first offending good.
pub fn checked_apply(
    inventory: &Inventory,
    delta: &InventoryDelta,
) -> Result<Inventory, AgentError> {
    if let Some(next) = inventory.apply(delta) {
        return Ok(next);
    }
    for good in [Good::A, Good::B, Good::Money] {
        let change = delta.get(good);
        if change < 0 {
            let requested = u32::try_from(change.unsigned_abs()).unwrap_or(u32::MAX);
            if requested > inventory.get(good) {
                return Err(AgentError::InsufficientHolding {
                    good,
                    requested,
                    available: inventory.get(good),
                });
            }
        }
    }
    Err(AgentError::ArithmeticOverflow {
        context: format!("applying {delta:?}"),
    })
}

/// Sum of several inventories, `None` on overflow.
pub fn total<'a>(inventories: impl IntoIterator<Item = &'a Inventory>) -> Option<(u64, u64, u64)> {
    inventories
        .into_iter()
        .try_fold((0_u64, 0_u64, 0_u64), |(a, b, m), inv| {
            Some((
                a.checked_add(u64::from(inv.a))?,
                b.checked_add(u64::from(inv.b))?,
                m.checked_add(u64::from(inv.m))?,
            ))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove() {
        let mut inv = Inventory::new(1, 2, 3);
        add_good(&mut inv, Good::B, 4).unwrap();
        remove_good(&mut inv, Good::Money, 3).unwrap();
        assert_eq!(inv, Inventory::new(1, 6, 0));
    }

    #[test]
    fn remove_more_than_held_fails() {
        let mut inv = Inventory::new(1, 0, 0);
        let err = remove_good(&mut inv, Good::A, 2);
        assert!(matches!(
            err,
            Err(AgentError::InsufficientHolding { good: Good::A, requested: 2, available: 1 })
        ));
        assert_eq!(inv.a, 1);
    }

    #[test]
    fn add_overflow_fails() {
        let mut inv = Inventory::new(u32::MAX, 0, 0);
        assert!(add_good(&mut inv, Good::A, 1).is_err());
    }

    #[test]
    fn has_good_zero_requested() {
        assert!(has_good(&Inventory::default(), Good::B, 0));
        assert!(!has_good(&Inventory::default(), Good::B, 1));
    }

    #[test]
    fn checked_apply_reports_shortfall() {
        let inv = Inventory::new(5, 1, 0);
        let delta = InventoryDelta { a: 2, b: -3, m: 0 };
        assert!(matches!(
            checked_apply(&inv, &delta),
            Err(AgentError::InsufficientHolding { good: Good::B, requested: 3, available: 1 })
        ));
        let ok = checked_apply(&inv, &InventoryDelta { a: -5, b: 1, m: 2 }).unwrap();
        assert_eq!(ok, Inventory::new(0, 2, 2));
    }

    #[test]
    fn totals_sum_per_good() {
        let invs = [Inventory::new(1, 2, 3), Inventory::new(4, 5, 6)];
        assert_eq!(total(&invs), Some((5, 7, 9)));
    }
}
