//! Registry of the resource nodes a base controller harvests from.
//!
//! Nodes are supplied once, at controller creation, and only ever shrink:
//! each tick the registry reconciles tracked nodes against the observed live
//! set and prunes the depleted ones. References into the registry are stable
//! node identifiers, so a removal can never invalidate another node's handle.

use std::collections::BTreeMap;

use quarry_types::{NodeId, NodeSnapshot, Point2};
use tracing::debug;

use crate::config::Tuning;
use crate::geometry::approach_point;

/// A node under management, with its precomputed movement data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedNode {
    /// Node center position.
    pub pos: Point2,
    /// Resource amount left, updated each tick from observations.
    pub remaining: u32,
    /// Waypoint near the node, offset toward the base. Fixed at creation.
    pub approach: Point2,
    /// Ideal crew size, derived from the distance to the base at creation.
    pub capacity: u32,
}

/// Ideal crew size for a node at the given distance from its base.
///
/// Two fixed bands near the base, then a coarser distance-scaled fallback:
/// `floor(distance / far_divisor)`.
pub const fn ideal_capacity(distance: f32, tuning: &Tuning) -> u32 {
    if distance < tuning.near_distance {
        return tuning.near_capacity;
    }
    if distance <= tuning.mid_distance {
        return tuning.mid_capacity;
    }
    scaled_capacity(distance, tuning.far_divisor)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn scaled_capacity(distance: f32, divisor: f32) -> u32 {
    // distance > mid_distance here, so the quotient is positive and small.
    (distance / divisor) as u32
}

/// The set of nodes one base controller harvests from.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    /// Node identifiers in ascending-distance-from-base order, fixed at
    /// creation. Pruning removes entries; nothing is ever re-sorted.
    order: Vec<NodeId>,
    nodes: BTreeMap<NodeId, TrackedNode>,
}

impl NodeRegistry {
    /// Build the registry from the initial node set.
    ///
    /// Nodes are sorted by ascending distance to `base_pos`; that order is
    /// the dispatch order for the rest of the controller's life. Approach
    /// points and crew capacities are computed here, once.
    pub fn new(base_pos: Point2, initial: &[NodeSnapshot], tuning: &Tuning) -> Self {
        let mut order: Vec<NodeId> = initial.iter().map(|n| n.id).collect();
        let by_id: BTreeMap<NodeId, &NodeSnapshot> =
            initial.iter().map(|n| (n.id, n)).collect();
        order.sort_by(|a, b| {
            let da = by_id.get(a).map_or(f32::MAX, |n| {
                n.pos.distance_squared_to(base_pos)
            });
            let db = by_id.get(b).map_or(f32::MAX, |n| {
                n.pos.distance_squared_to(base_pos)
            });
            da.total_cmp(&db)
        });

        let nodes = initial
            .iter()
            .map(|snap| {
                let distance = snap.pos.distance_to(base_pos);
                let tracked = TrackedNode {
                    pos: snap.pos,
                    remaining: snap.remaining,
                    approach: approach_point(
                        snap.pos,
                        base_pos,
                        tuning.lateral_offset,
                        tuning.approach_nudge,
                    ),
                    capacity: ideal_capacity(distance, tuning),
                };
                (snap.id, tracked)
            })
            .collect();

        Self { order, nodes }
    }

    /// Look up a tracked node.
    pub fn get(&self, id: NodeId) -> Option<&TrackedNode> {
        self.nodes.get(&id)
    }

    /// Whether `id` is an active node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Active node identifiers in ascending-distance order.
    pub fn ordered(&self) -> &[NodeId] {
        &self.order
    }

    /// Iterate active nodes in ascending-distance order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TrackedNode)> {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|n| (*id, n)))
    }

    /// Number of active nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes remain.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sum of per-node ideal crew capacities.
    pub fn capacity_sum(&self) -> u32 {
        self.nodes
            .values()
            .fold(0_u32, |acc, n| acc.saturating_add(n.capacity))
    }

    /// Reconcile tracked nodes against the observed live set.
    ///
    /// Updates remaining amounts for every tracked node present in
    /// `observed`; prunes nodes that report zero remaining or are absent
    /// from the observation entirely. Returns the pruned identifiers so the
    /// caller can reset assignments that pointed at them.
    pub fn sync(&mut self, observed: &[NodeSnapshot]) -> Vec<NodeId> {
        let live: BTreeMap<NodeId, u32> =
            observed.iter().map(|n| (n.id, n.remaining)).collect();

        let mut pruned = Vec::new();
        for id in &self.order {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            match live.get(id) {
                Some(&remaining) if remaining > 0 => node.remaining = remaining,
                _ => pruned.push(*id),
            }
        }

        for id in &pruned {
            self.nodes.remove(id);
            debug!(node = %id, "node depleted, removed from registry");
        }
        self.order.retain(|id| self.nodes.contains_key(id));
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(tag: u64, x: f32, y: f32, remaining: u32) -> NodeSnapshot {
        NodeSnapshot {
            id: NodeId::new(tag),
            pos: Point2::new(x, y),
            remaining,
        }
    }

    fn make_registry() -> NodeRegistry {
        // Distances from the origin base: 8, 5, 12.
        let nodes = [
            snap(1, 8.0, 0.0, 900),
            snap(2, 5.0, 0.0, 900),
            snap(3, 12.0, 0.0, 900),
        ];
        NodeRegistry::new(Point2::new(0.0, 0.0), &nodes, &Tuning::default())
    }

    #[test]
    fn capacity_bands() {
        let tuning = Tuning::default();
        assert_eq!(ideal_capacity(5.0, &tuning), 2);
        assert_eq!(ideal_capacity(6.9, &tuning), 2);
        assert_eq!(ideal_capacity(7.0, &tuning), 3);
        assert_eq!(ideal_capacity(9.0, &tuning), 3);
        assert_eq!(ideal_capacity(9.6, &tuning), 1);
        assert_eq!(ideal_capacity(12.0, &tuning), 2);
        assert_eq!(ideal_capacity(26.0, &tuning), 5);
    }

    #[test]
    fn nodes_are_ordered_by_distance() {
        let registry = make_registry();
        let order: Vec<u64> = registry.ordered().iter().map(|id| id.into_inner()).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn capacities_fixed_at_creation() {
        let registry = make_registry();
        assert_eq!(registry.get(NodeId::new(2)).map(|n| n.capacity), Some(2));
        assert_eq!(registry.get(NodeId::new(1)).map(|n| n.capacity), Some(3));
        assert_eq!(registry.get(NodeId::new(3)).map(|n| n.capacity), Some(2));
        assert_eq!(registry.capacity_sum(), 7);
    }

    #[test]
    fn approach_points_sit_between_node_and_base() {
        let registry = make_registry();
        let base = Point2::new(0.0, 0.0);
        for (_, node) in registry.iter() {
            assert!(base.distance_to(node.approach) < base.distance_to(node.pos));
        }
    }

    #[test]
    fn sync_updates_remaining() {
        let mut registry = make_registry();
        let pruned = registry.sync(&[
            snap(1, 8.0, 0.0, 340),
            snap(2, 5.0, 0.0, 895),
            snap(3, 12.0, 0.0, 900),
        ]);
        assert!(pruned.is_empty());
        assert_eq!(registry.get(NodeId::new(1)).map(|n| n.remaining), Some(340));
        assert_eq!(registry.get(NodeId::new(2)).map(|n| n.remaining), Some(895));
    }

    #[test]
    fn sync_prunes_depleted_nodes() {
        let mut registry = make_registry();
        let pruned = registry.sync(&[
            snap(1, 8.0, 0.0, 0),
            snap(2, 5.0, 0.0, 10),
            snap(3, 12.0, 0.0, 10),
        ]);
        assert_eq!(pruned, vec![NodeId::new(1)]);
        assert!(!registry.contains(NodeId::new(1)));
        assert_eq!(registry.len(), 2);
        let order: Vec<u64> = registry.ordered().iter().map(|id| id.into_inner()).collect();
        assert_eq!(order, vec![2, 3]);
    }

    #[test]
    fn sync_prunes_nodes_missing_from_observation() {
        let mut registry = make_registry();
        let pruned = registry.sync(&[snap(2, 5.0, 0.0, 10)]);
        assert_eq!(pruned.len(), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(NodeId::new(2)));
    }

    #[test]
    fn remaining_capacity_survives_partial_prunes() {
        let mut registry = make_registry();
        registry.sync(&[snap(1, 8.0, 0.0, 10), snap(3, 12.0, 0.0, 10)]);
        // Node 2 (capacity 2) gone; 3 + 2 remain.
        assert_eq!(registry.capacity_sum(), 5);
    }
}
