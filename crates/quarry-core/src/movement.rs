//! Per-worker movement logic: phase transitions and command emission.
//!
//! Each tick runs two passes over the roster. [`resolve_phase`] advances a
//! worker's gather-loop phase from what the engine reports (the cargo flag
//! edge plus node proximity), and [`emit_command`] translates the phase into
//! at most one order. Keeping the passes separate means every transition in
//! a tick is settled before the first command goes out.

use quarry_types::{
    BaseId, CommandTarget, HarvestPhase, NodeId, OrderKind, OrderTarget, TravelPhase,
    WorkerSnapshot, WorkerState,
};

use crate::command::CommandSink;
use crate::nodes::TrackedNode;

/// A cargo-flag edge observed on one worker this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CargoEdge {
    /// Was carrying last tick, empty now: the cargo was dropped at a base.
    Delivered,
    /// Was empty last tick, carrying now: the worker finished extracting.
    PickedUp,
}

/// Advance one worker's phase from this tick's snapshot.
///
/// The cargo flag edge dominates: a drop restarts the outbound leg and a
/// pickup starts the return leg, both with the travel leg re-armed. With no
/// edge, an empty-handed worker close enough to its node (or to the node's
/// approach point) switches to gathering. The stored cargo flag is always
/// refreshed at the end, so each edge fires exactly once.
pub fn resolve_phase(
    state: &mut WorkerState,
    snap: &WorkerSnapshot,
    node: Option<&TrackedNode>,
    gather_radius: f32,
) -> Option<CargoEdge> {
    let mut edge = None;

    if state.had_cargo && !snap.carrying_cargo {
        state.harvest = HarvestPhase::MovingToNode;
        state.travel = TravelPhase::Entering;
        edge = Some(CargoEdge::Delivered);
    } else if !state.had_cargo && snap.carrying_cargo {
        state.harvest = HarvestPhase::ReturningCargo;
        state.travel = TravelPhase::Entering;
        edge = Some(CargoEdge::PickedUp);
    } else if !snap.carrying_cargo {
        let near = node.is_some_and(|n| {
            snap.pos.distance_to(n.pos) < gather_radius
                || snap.pos.distance_to(n.approach) < gather_radius
        });
        if near {
            state.harvest = HarvestPhase::GatheringNode;
        }
    }

    state.had_cargo = snap.carrying_cargo;
    edge
}

/// Emit at most one order for a worker based on its settled phase.
///
/// Outbound legs get a single smart-click at the approach point followed by
/// plain move orders every tick; the return leg gets a single delivery
/// interact and then trusts the engine. Gathering workers are only touched
/// when idle or visibly extracting from the wrong node.
///
/// A worker on the return leg needs no assignment: held cargo is delivered
/// regardless of whether the matcher currently pairs the worker with a node.
pub fn emit_command(
    state: &mut WorkerState,
    snap: &WorkerSnapshot,
    assigned: Option<(NodeId, &TrackedNode)>,
    base: BaseId,
    sink: &mut dyn CommandSink,
) {
    match state.harvest {
        HarvestPhase::ReturningCargo => {
            if state.travel == TravelPhase::Entering {
                sink.interact(snap.id, CommandTarget::Base(base));
                state.travel = TravelPhase::Accelerating;
            }
        }
        HarvestPhase::MovingToNode => {
            let Some((_, node)) = assigned else {
                return;
            };
            match state.travel {
                TravelPhase::Entering => {
                    sink.interact(snap.id, CommandTarget::Point(node.approach));
                    state.travel = TravelPhase::Accelerating;
                }
                TravelPhase::Accelerating => {
                    sink.move_to(snap.id, node.approach);
                }
            }
        }
        HarvestPhase::GatheringNode => {
            let Some((node_id, _)) = assigned else {
                return;
            };
            match snap.orders.first() {
                None => sink.interact(snap.id, CommandTarget::Node(node_id)),
                Some(order) => {
                    let wrong_node = order.kind == OrderKind::Gather
                        && order.target != Some(OrderTarget::Node(node_id));
                    if wrong_node {
                        sink.interact(snap.id, CommandTarget::Node(node_id));
                    }
                }
            }
        }
    }
}

/// Re-issue a gather interact for a worker with an empty order queue.
///
/// Danger-mode recovery: while ordinary movement is suspended, a worker that
/// has gone fully idle is pointed back at its node so it resumes work the
/// moment the threat clears. Returns whether a command was emitted.
pub fn nudge_idle_worker(
    snap: &WorkerSnapshot,
    assigned: Option<NodeId>,
    sink: &mut dyn CommandSink,
) -> bool {
    if !snap.orders.is_empty() {
        return false;
    }
    let Some(node_id) = assigned else {
        return false;
    };
    sink.interact(snap.id, CommandTarget::Node(node_id));
    true
}
