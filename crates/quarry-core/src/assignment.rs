//! Worker-to-node assignment: capacity-aware greedy matching with minimal
//! churn.
//!
//! [`allocate`] rebalances the worker/node pairing when the roster changes.
//! It is deliberately a greedy heuristic, not an optimal matcher: existing
//! valid pairings are kept wherever possible, only the excess and deficit
//! move, and recomputation stays cheap for the small bounded sets involved.

use std::collections::{BTreeMap, VecDeque};

use quarry_types::{NodeId, Point2, WorkerId, WorkerSnapshot};
use tracing::debug;

use crate::geometry::centroid;
use crate::nodes::NodeRegistry;

/// The worker-to-node pairing of one base.
///
/// Absence of an entry means the worker is unassigned. Entries only ever
/// reference active nodes; the controller resets entries whose node was
/// pruned before anything else reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pairs: BTreeMap<WorkerId, NodeId>,
}

impl Assignment {
    /// Empty assignment.
    pub const fn new() -> Self {
        Self {
            pairs: BTreeMap::new(),
        }
    }

    /// The node `worker` is paired with, if any.
    pub fn node_for(&self, worker: WorkerId) -> Option<NodeId> {
        self.pairs.get(&worker).copied()
    }

    /// Pair `worker` with `node`, replacing any previous pairing.
    pub fn assign(&mut self, worker: WorkerId, node: NodeId) {
        self.pairs.insert(worker, node);
    }

    /// Remove `worker`'s pairing. Returns the node it was paired with.
    pub fn unassign(&mut self, worker: WorkerId) -> Option<NodeId> {
        self.pairs.remove(&worker)
    }

    /// Remove every pairing that references `node`. Returns the freed
    /// workers. Used when a node is pruned from the registry.
    pub fn release_node(&mut self, node: NodeId) -> Vec<WorkerId> {
        let freed: Vec<WorkerId> = self
            .pairs
            .iter()
            .filter(|(_, n)| **n == node)
            .map(|(w, _)| *w)
            .collect();
        for worker in &freed {
            self.pairs.remove(worker);
        }
        freed
    }

    /// Number of workers currently paired with `node`.
    pub fn crew_size(&self, node: NodeId) -> usize {
        self.pairs.values().filter(|n| **n == node).count()
    }

    /// Iterate all pairings, ascending by worker.
    pub fn iter(&self) -> impl Iterator<Item = (WorkerId, NodeId)> + '_ {
        self.pairs.iter().map(|(w, n)| (*w, *n))
    }

    /// Number of active pairings.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no worker is paired.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Compute a fresh worker-to-node pairing.
///
/// Keeps every still-valid pairing from `current`, sheds over-capacity crews
/// (the workers closest to the node stay), then dispatches the pooled free
/// agents: farthest-from-the-pool-centroid first, each to the least-loaded
/// node with room (ties broken by queue stability, not distance). Workers
/// beyond total capacity are left unpaired; the returned mapping never
/// exceeds any node's capacity.
pub fn allocate(
    workers: &[WorkerSnapshot],
    registry: &NodeRegistry,
    current: &Assignment,
) -> Assignment {
    let positions: BTreeMap<WorkerId, Point2> =
        workers.iter().map(|w| (w.id, w.pos)).collect();

    let mut pairs: BTreeMap<WorkerId, NodeId> = BTreeMap::new();
    let mut crews: BTreeMap<NodeId, Vec<WorkerId>> = registry
        .ordered()
        .iter()
        .map(|id| (*id, Vec::new()))
        .collect();
    let mut free_agents: Vec<WorkerId> = Vec::new();

    // Partition: keep still-valid pairings, pool everyone else.
    for snap in workers {
        let valid = current
            .node_for(snap.id)
            .filter(|node| registry.contains(*node));
        match valid {
            Some(node) => {
                pairs.insert(snap.id, node);
                if let Some(crew) = crews.get_mut(&node) {
                    crew.push(snap.id);
                }
            }
            None => free_agents.push(snap.id),
        }
    }

    // Shed over-capacity crews (closest stay); queue nodes with room, in
    // the fixed ascending-distance order.
    let mut free_nodes: VecDeque<NodeId> = VecDeque::new();
    for (node_id, node) in registry.iter() {
        let Some(crew) = crews.get_mut(&node_id) else {
            continue;
        };
        let cap = usize::try_from(node.capacity).unwrap_or(usize::MAX);
        if crew.len() > cap {
            let anchor = node.pos;
            crew.sort_by(|a, b| {
                let da = positions
                    .get(a)
                    .map_or(f32::MAX, |p| p.distance_squared_to(anchor));
                let db = positions
                    .get(b)
                    .map_or(f32::MAX, |p| p.distance_squared_to(anchor));
                da.total_cmp(&db)
            });
            for shed in crew.split_off(cap) {
                pairs.remove(&shed);
                free_agents.push(shed);
            }
        } else if crew.len() < cap {
            free_nodes.push_back(node_id);
        }
    }

    // Farthest free agent from the pool centroid is dispatched first:
    // stragglers reach their opportunity before nearby workers crowd the
    // best nodes. Ascending sort, pop from the back.
    let free_positions: Vec<Point2> = free_agents
        .iter()
        .filter_map(|id| positions.get(id).copied())
        .collect();
    if let Some(cog) = centroid(&free_positions) {
        free_agents.sort_by(|a, b| {
            let da = positions
                .get(a)
                .map_or(f32::MAX, |p| p.distance_squared_to(cog));
            let db = positions
                .get(b)
                .map_or(f32::MAX, |p| p.distance_squared_to(cog));
            da.total_cmp(&db)
        });
    }

    // Match until either pool runs dry.
    while !free_nodes.is_empty() {
        let Some(worker) = free_agents.pop() else {
            break;
        };
        free_nodes
            .make_contiguous()
            .sort_by_key(|id| crews.get(id).map_or(0, Vec::len));
        let Some(node_id) = free_nodes.pop_front() else {
            break;
        };

        pairs.insert(worker, node_id);
        let crew_len = crews.get_mut(&node_id).map_or(1, |crew| {
            crew.push(worker);
            crew.len()
        });
        let cap = registry
            .get(node_id)
            .map_or(0, |n| usize::try_from(n.capacity).unwrap_or(usize::MAX));
        if crew_len < cap {
            free_nodes.push_back(node_id);
        }
    }

    let assignment = Assignment { pairs };
    debug!(
        paired = assignment.len(),
        unpaired = free_agents.len(),
        "allocation pass complete"
    );
    assignment
}
