//! Type-safe identifier wrappers around raw engine unit tags.
//!
//! Every entity the controller touches has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. The underlying value is
//! the `u64` tag the game engine assigns to a unit; tags are stable for the
//! lifetime of the physical unit and are never generated on our side.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a `u64` engine tag with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw engine tag.
            pub const fn new(tag: u64) -> Self {
                Self(tag)
            }

            /// Return the raw engine tag.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(tag: u64) -> Self {
                Self(tag)
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
    /// Unique identifier for a worker unit.
    WorkerId
}

define_id! {
    /// Unique identifier for a resource node.
    NodeId
}

define_id! {
    /// Unique identifier for a base structure.
    BaseId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_wrap_raw_tags() {
        let worker = WorkerId::new(42);
        assert_eq!(worker.into_inner(), 42);
        assert_eq!(u64::from(worker), 42);
        assert_eq!(WorkerId::from(42), worker);
    }

    #[test]
    fn ids_display_as_raw_tags() {
        let node = NodeId::new(1_017);
        assert_eq!(node.to_string(), "1017");
    }

    #[test]
    fn ids_order_by_tag() {
        let a = BaseId::new(1);
        let b = BaseId::new(2);
        assert!(a < b);
    }
}
