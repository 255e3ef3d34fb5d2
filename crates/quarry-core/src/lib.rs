//! Base-economy control core: worker assignment and per-tick movement for
//! the Quarry harvest bot.
//!
//! The crate is observation-in, commands-out: each tick the embedding layer
//! hands a controller what it sees and collects the orders it wants issued.
//! Nothing here talks to an engine directly.
//!
//! # Modules
//!
//! - [`assignment`] -- Capacity-aware greedy worker-to-node matching.
//! - [`command`] -- [`CommandSink`] trait and the recording test sink.
//! - [`config`] -- Configuration loading from `quarry-config.yaml` into
//!   strongly-typed structs.
//! - [`controller`] -- The per-base tick loop tying everything together.
//! - [`coordinator`] -- Worker routing across multiple bases.
//! - [`error`] -- Control-plane error types.
//! - [`geometry`] -- Approach-point and centroid helpers.
//! - [`movement`] -- Per-worker phase transitions and command emission.
//! - [`nodes`] -- Tracked node registry with capacity bands and pruning.
//! - [`roster`] -- Per-worker control records and overlap detection.
//! - [`telemetry`] -- Delivery and round-trip accounting.
//!
//! [`CommandSink`]: command::CommandSink

pub mod assignment;
pub mod command;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod geometry;
pub mod movement;
pub mod nodes;
pub mod roster;
pub mod telemetry;
