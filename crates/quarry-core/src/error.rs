//! Error types for controller and coordinator operations.
//!
//! The per-tick control path never fails: absence-of-data cases degrade to
//! skips and heal on the next tick. Errors exist only at the constructive
//! edges, where a caller wires bases into the coordinator.

use quarry_types::BaseId;

/// Errors from coordinator base management.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// A base with this identifier is already registered.
    #[error("base {base} is already registered")]
    DuplicateBase {
        /// The identifier that was registered twice.
        base: BaseId,
    },

    /// No base with this identifier is registered.
    #[error("no base {base} is registered")]
    UnknownBase {
        /// The identifier that was looked up.
        base: BaseId,
    },
}
