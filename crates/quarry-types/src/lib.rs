//! Shared type definitions for the Quarry harvest controller.
//!
//! This crate is the single source of truth for the data model shared across
//! the Quarry workspace: identifiers, planar geometry, per-worker control
//! state, the per-tick observation payload, and the commands emitted back to
//! the engine.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers around raw `u64` engine unit tags
//! - [`geometry`] -- [`Point2`] planar point math
//! - [`worker`] -- Harvest/travel/overlap phases and the per-worker record
//! - [`observation`] -- Per-tick snapshots supplied by the environment
//! - [`command`] -- Commands emitted toward the engine

pub mod command;
pub mod geometry;
pub mod ids;
pub mod observation;
pub mod worker;

// Re-export all public types at crate root for convenience.
pub use command::{Command, CommandTarget};
pub use geometry::Point2;
pub use ids::{BaseId, NodeId, WorkerId};
pub use observation::{
    BaseSite, NodeSnapshot, Observation, OrderKind, OrderTarget, PendingOrder, WorkerSnapshot,
    WorldObservation,
};
pub use worker::{HarvestPhase, OverlapState, TravelPhase, WorkerState};
