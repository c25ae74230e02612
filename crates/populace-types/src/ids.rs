//! Type-safe identifier wrappers around arena indices.
//!
//! Agents and unions live in arenas owned by the cycle engine. Each entity
//! gets a strongly-typed, monotonically assigned index so an agent id can
//! never be confused with a union id. Ids are never reused within a run.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a `u64` arena index with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// Return the raw index value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }

            /// Return the identifier that follows this one.
            ///
            /// Saturates at `u64::MAX`, which no realistic run approaches.
            pub const fn next(self) -> Self {
                Self(self.0.saturating_add(1))
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an individual in the population arena.
    AgentId
}

define_id! {
    /// Unique identifier for a breeding union.
    UnionId
}
