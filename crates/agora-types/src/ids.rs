//! Type-safe identifier wrappers around integer ids.
//!
//! Agents carry a globally ordered integer id. Every ordering decision in
//! the simulation (iteration order, tie-breaks) goes through the derived
//! `Ord` on these wrappers, so ids are plain `u32` rather than random UUIDs.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u32` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an identifier from its raw integer value.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the inner integer value.
            pub const fn into_inner(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique, totally ordered identifier for an agent in the simulation.
    AgentId
}

/// Canonical ordering of an unordered agent pair: `(min id, max id)`.
///
/// Every pair-keyed sort and every pair iteration uses this key.
pub fn pair_key(first: AgentId, second: AgentId) -> (AgentId, AgentId) {
    if first <= second {
        (first, second)
    } else {
        (second, first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_raw_value() {
        assert!(AgentId::new(1) < AgentId::new(2));
        assert_eq!(AgentId::new(7).into_inner(), 7);
    }

    #[test]
    fn pair_key_is_canonical() {
        let a = AgentId::new(9);
        let b = AgentId::new(3);
        assert_eq!(pair_key(a, b), (b, a));
        assert_eq!(pair_key(b, a), (b, a));
    }

    #[test]
    fn id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&AgentId::new(42)).ok();
        assert_eq!(json.as_deref(), Some("42"));
        let restored: Result<AgentId, _> = serde_json::from_str("42");
        assert_eq!(restored.ok(), Some(AgentId::new(42)));
    }

    #[test]
    fn id_display_matches_raw() {
        assert_eq!(AgentId::new(5).to_string(), "5");
    }
}
