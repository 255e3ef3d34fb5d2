//! Commands the controller emits toward the engine.
//!
//! Two kinds exist, mirroring what the engine accepts: a smart-interact
//! (issue or replace the unit's current order) and a plain move. Both are
//! fire-and-forget; no result ever flows back into the controller.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;
use crate::ids::{BaseId, NodeId, WorkerId};

/// The entity or ground point an interact command is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CommandTarget {
    /// Interact with a resource node (starts gathering).
    Node(NodeId),
    /// Interact with a base (delivers held cargo).
    Base(BaseId),
    /// Smart-click a ground point (moves, replacing the current order).
    Point(Point2),
}

/// One command issued to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Issue or replace the worker's current order.
    Interact {
        /// The worker being ordered.
        worker: WorkerId,
        /// What to interact with.
        target: CommandTarget,
    },
    /// Plain relocation toward a ground point.
    Move {
        /// The worker being ordered.
        worker: WorkerId,
        /// Destination point.
        point: Point2,
    },
}

impl Command {
    /// The worker this command is addressed to.
    pub const fn worker(&self) -> WorkerId {
        match self {
            Self::Interact { worker, .. } | Self::Move { worker, .. } => *worker,
        }
    }
}
