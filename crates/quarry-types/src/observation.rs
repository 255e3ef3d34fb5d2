//! Per-tick observation payloads supplied by the environment.
//!
//! The controller never queries the engine directly; each tick the embedding
//! layer hands it a snapshot of everything it is allowed to see. Snapshots
//! are plain data: identifiers, positions, cargo flags, and the orders the
//! engine currently holds for each unit.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;
use crate::ids::{BaseId, NodeId, WorkerId};

/// What kind of order a worker is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Extracting from a resource node.
    Gather,
    /// Delivering held cargo to a base.
    DeliverCargo,
    /// Plain relocation.
    Move,
    /// Anything else the engine reports (abilities, idle fidgets, ...).
    Other,
}

/// The entity or ground point an order is directed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderTarget {
    /// A resource node.
    Node(NodeId),
    /// A base structure.
    Base(BaseId),
    /// A ground point.
    Point(Point2),
}

/// One entry of a worker's current order queue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    /// What the order does.
    pub kind: OrderKind,
    /// What it is directed at, when the engine reports a target.
    pub target: Option<OrderTarget>,
}

/// Per-tick snapshot of one live worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    /// Stable engine tag for this worker.
    pub id: WorkerId,
    /// Current map position.
    pub pos: Point2,
    /// Collision radius, used for overlap detection.
    pub radius: f32,
    /// Whether the worker currently holds cargo.
    pub carrying_cargo: bool,
    /// Orders the engine currently holds for this worker, front first.
    pub orders: Vec<PendingOrder>,
}

/// Per-tick snapshot of one live resource node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Stable engine tag for this node.
    pub id: NodeId,
    /// Node center position. Fixed for the node's lifetime.
    pub pos: Point2,
    /// Resource amount left in the node. Zero means depleted.
    pub remaining: u32,
}

/// Identity and position of a base structure. Fixed once registered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseSite {
    /// Stable engine tag for the base.
    pub id: BaseId,
    /// Base position.
    pub pos: Point2,
}

/// Everything one base controller sees on one tick.
///
/// `workers` and `nodes` are the complete live sets: a tracked entity absent
/// from its set is treated as gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Whether the anchoring base is still alive.
    pub base_alive: bool,
    /// Whether the base is under threat (suspends ordinary movement logic).
    pub danger: bool,
    /// Live workers attached to this base.
    pub workers: Vec<WorkerSnapshot>,
    /// Live resource nodes. Entries for nodes the controller does not track
    /// are ignored.
    pub nodes: Vec<NodeSnapshot>,
}

/// Everything the multi-base coordinator sees on one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObservation {
    /// Bases still alive this tick.
    pub live_bases: Vec<BaseId>,
    /// Whether any base is under threat.
    pub danger: bool,
    /// All live workers, not yet partitioned per base.
    pub workers: Vec<WorkerSnapshot>,
    /// All live resource nodes.
    pub nodes: Vec<NodeSnapshot>,
}

impl WorldObservation {
    /// Whether `base` is among the live bases this tick.
    pub fn base_is_alive(&self, base: BaseId) -> bool {
        self.live_bases.contains(&base)
    }
}
