//! Per-base harvest controller: the tick loop that drives one base's
//! workforce.
//!
//! Each call to [`BaseController::step`] runs through these phases:
//!
//! 1. **Node sync** -- reconcile tracked nodes against the observed live
//!    set; crews of depleted nodes are released but not yet re-dispatched.
//! 2. **Roster** -- reconcile worker records, refresh overlap flags, and
//!    rebalance assignments whenever the workforce changed.
//! 3. **Danger hold** -- while the base is threatened, phase bookkeeping is
//!    frozen; only fully idle assigned workers are re-pointed at their node.
//! 4. **Transitions** -- settle every worker's gather-loop phase from this
//!    tick's snapshot, recording deliveries as they are detected.
//! 5. **Emission** -- translate settled phases into at most one order per
//!    worker.
//!
//! Transitions are settled for the whole roster before the first command
//! goes out, so no order is computed from a half-updated state.

use quarry_types::{
    BaseSite, NodeId, NodeSnapshot, Observation, WorkerId, WorkerSnapshot, WorkerState,
};
use tracing::{debug, info};

use crate::assignment::{self, Assignment};
use crate::command::CommandSink;
use crate::config::Tuning;
use crate::movement::{self, CargoEdge};
use crate::nodes::NodeRegistry;
use crate::roster::Roster;
use crate::telemetry::HarvestTelemetry;

/// Controls the harvest workforce of a single base.
#[derive(Debug)]
pub struct BaseController {
    base: BaseSite,
    tuning: Tuning,
    registry: NodeRegistry,
    roster: Roster,
    assignment: Assignment,
    telemetry: HarvestTelemetry,
    tick: u64,
}

impl BaseController {
    /// Create a controller for `base` harvesting from `nodes`.
    ///
    /// The node set is fixed here; it only ever shrinks afterwards, through
    /// per-tick pruning of depleted nodes.
    pub fn new(base: BaseSite, nodes: &[NodeSnapshot], tuning: Tuning) -> Self {
        let registry = NodeRegistry::new(base.pos, nodes, &tuning);
        info!(
            base = %base.id,
            nodes = registry.len(),
            capacity = registry.capacity_sum(),
            "base controller created"
        );
        Self {
            base,
            tuning,
            registry,
            roster: Roster::new(),
            assignment: Assignment::new(),
            telemetry: HarvestTelemetry::new(),
            tick: 0,
        }
    }

    /// Run one control tick.
    ///
    /// A tick with a dead base or an empty workforce is a no-op: no
    /// commands, no state changes beyond the tick counter.
    pub fn step(&mut self, observation: &Observation, sink: &mut dyn CommandSink) {
        self.tick = self.tick.saturating_add(1);

        if !observation.base_alive || observation.workers.is_empty() {
            return;
        }

        // --- Phase 1: node sync ---
        self.sync_nodes(&observation.nodes);

        // --- Phase 2: roster ---
        self.update_roster(&observation.workers);

        // --- Phase 3: danger hold ---
        if observation.danger {
            self.hold_under_threat(&observation.workers, sink);
            return;
        }

        // --- Phase 4: transitions ---
        for snap in &observation.workers {
            let node = self
                .assignment
                .node_for(snap.id)
                .and_then(|id| self.registry.get(id));
            let Some(state) = self.roster.get_mut(snap.id) else {
                continue;
            };
            let edge = movement::resolve_phase(state, snap, node, self.tuning.gather_radius);
            if edge == Some(CargoEdge::Delivered) {
                self.telemetry.record_delivery(snap.id, self.tick);
                debug!(worker = %snap.id, tick = self.tick, "cargo delivered");
            }
        }

        // --- Phase 5: emission ---
        for snap in &observation.workers {
            let assigned = self
                .assignment
                .node_for(snap.id)
                .and_then(|id| self.registry.get(id).map(|node| (id, node)));
            let Some(state) = self.roster.get_mut(snap.id) else {
                continue;
            };
            movement::emit_command(state, snap, assigned, self.base.id, sink);
        }
    }

    /// Prune depleted nodes and release their crews.
    ///
    /// Released workers stay unassigned until the next roster change; an
    /// immediate re-dispatch would crowd the surviving nodes past the point
    /// the capacity model considers productive.
    fn sync_nodes(&mut self, live: &[NodeSnapshot]) {
        for node in self.registry.sync(live) {
            let freed = self.assignment.release_node(node);
            if !freed.is_empty() {
                debug!(
                    base = %self.base.id,
                    node = %node,
                    freed = freed.len(),
                    "crew released from depleted node"
                );
            }
        }
    }

    /// Reconcile worker records and rebalance assignments on any change.
    fn update_roster(&mut self, workers: &[WorkerSnapshot]) {
        let change = self.roster.reconcile(workers);
        for worker in &change.removed {
            self.assignment.unassign(*worker);
            self.telemetry.forget(*worker);
        }
        self.roster.mark_overlaps(workers, self.tuning.overlap_factor);

        if change.changed() {
            self.assignment = assignment::allocate(workers, &self.registry, &self.assignment);
            info!(
                base = %self.base.id,
                workers = workers.len(),
                assigned = self.assignment.len(),
                hired = change.added.len(),
                lost = change.removed.len(),
                "workforce rebalanced"
            );
        }
    }

    /// Threat response: freeze phase bookkeeping, keep idle workers on task.
    fn hold_under_threat(&self, workers: &[WorkerSnapshot], sink: &mut dyn CommandSink) {
        let mut nudged = 0_u32;
        for snap in workers {
            let assigned = self.assignment.node_for(snap.id);
            if movement::nudge_idle_worker(snap, assigned, sink) {
                nudged = nudged.saturating_add(1);
            }
        }
        debug!(base = %self.base.id, tick = self.tick, nudged, "holding under threat");
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The workforce size this base's nodes support, plus the configured
    /// reserve. The reserve keeps a replacement in the pipeline; it is
    /// advisory for whoever trains workers and never affects assignment.
    pub fn ideal_harvester_count(&self) -> u32 {
        self.registry
            .capacity_sum()
            .saturating_add(self.tuning.reserve_slots)
    }

    /// Number of workers currently assigned to a node.
    pub fn current_harvester_count(&self) -> u32 {
        u32::try_from(self.assignment.len()).unwrap_or(u32::MAX)
    }

    /// The base this controller anchors to.
    pub const fn base(&self) -> BaseSite {
        self.base
    }

    /// The surviving tracked nodes.
    pub const fn nodes(&self) -> &NodeRegistry {
        &self.registry
    }

    /// The node `worker` is assigned to, if any.
    pub fn node_for(&self, worker: WorkerId) -> Option<NodeId> {
        self.assignment.node_for(worker)
    }

    /// Control state of one worker.
    pub fn worker_state(&self, worker: WorkerId) -> Option<WorkerState> {
        self.roster.get(worker).copied()
    }

    /// Delivery counters for this base.
    pub const fn telemetry(&self) -> &HarvestTelemetry {
        &self.telemetry
    }
}

#[cfg(test)]
mod tests {
    use quarry_types::{Command, CommandTarget, HarvestPhase, Point2, TravelPhase};

    use super::*;
    use crate::command::RecordingSink;

    fn base_site() -> BaseSite {
        BaseSite {
            id: quarry_types::BaseId::new(100),
            pos: Point2::new(0.0, 0.0),
        }
    }

    fn node(tag: u64, x: f32, y: f32) -> NodeSnapshot {
        NodeSnapshot {
            id: NodeId::new(tag),
            pos: Point2::new(x, y),
            remaining: 900,
        }
    }

    /// Nodes at distances 5, 8, 12: capacities 2, 3, 2.
    fn three_band_nodes() -> Vec<NodeSnapshot> {
        vec![
            node(10, 5.0, 0.0),
            node(20, 8.0, 0.0),
            node(30, 12.0, 0.0),
        ]
    }

    fn worker(tag: u64, x: f32, y: f32, carrying: bool) -> WorkerSnapshot {
        WorkerSnapshot {
            id: WorkerId::new(tag),
            pos: Point2::new(x, y),
            radius: 0.4,
            carrying_cargo: carrying,
            orders: Vec::new(),
        }
    }

    fn squad(count: usize) -> Vec<WorkerSnapshot> {
        let spots: [(u64, f32); 6] = [
            (1, 0.0),
            (2, 0.5),
            (3, 1.0),
            (4, 1.5),
            (5, 2.0),
            (6, 2.5),
        ];
        spots
            .iter()
            .take(count)
            .map(|(tag, y)| worker(*tag, 1.0, *y, false))
            .collect()
    }

    fn observation(workers: Vec<WorkerSnapshot>, nodes: Vec<NodeSnapshot>) -> Observation {
        Observation {
            base_alive: true,
            danger: false,
            workers,
            nodes,
        }
    }

    fn make_controller() -> BaseController {
        BaseController::new(base_site(), &three_band_nodes(), Tuning::default())
    }

    #[test]
    fn dead_base_tick_is_a_no_op() {
        let mut controller = make_controller();
        let mut obs = observation(squad(3), three_band_nodes());
        obs.base_alive = false;
        let mut sink = RecordingSink::new();

        controller.step(&obs, &mut sink);

        assert!(sink.commands.is_empty());
        assert_eq!(controller.current_harvester_count(), 0);
        assert!(controller.worker_state(WorkerId::new(1)).is_none());
    }

    #[test]
    fn tick_without_workers_is_a_no_op() {
        let mut controller = make_controller();
        let obs = observation(Vec::new(), three_band_nodes());
        let mut sink = RecordingSink::new();

        controller.step(&obs, &mut sink);

        assert!(sink.commands.is_empty());
    }

    #[test]
    fn ideal_count_sums_capacities_plus_reserve() {
        let controller = make_controller();
        // 2 + 3 + 2 capacity, plus one reserve slot.
        assert_eq!(controller.ideal_harvester_count(), 8);
    }

    #[test]
    fn first_tick_hires_assigns_and_dispatches() {
        let mut controller = make_controller();
        let obs = observation(squad(5), three_band_nodes());
        let mut sink = RecordingSink::new();

        controller.step(&obs, &mut sink);

        assert_eq!(controller.current_harvester_count(), 5);
        // Every assigned worker is outbound: one smart-click each at its
        // node's approach point.
        assert_eq!(sink.commands.len(), 5);
        for command in &sink.commands {
            assert!(matches!(
                command,
                Command::Interact {
                    target: CommandTarget::Point(_),
                    ..
                }
            ));
        }
        let state = controller.worker_state(WorkerId::new(1));
        assert!(state.is_some_and(|s| s.travel == TravelPhase::Accelerating));
    }

    #[test]
    fn depleted_node_sheds_its_crew_without_rebalancing() {
        let mut controller = make_controller();
        let obs = observation(squad(5), three_band_nodes());
        let mut sink = RecordingSink::new();
        controller.step(&obs, &mut sink);

        let closest = NodeId::new(10);
        let crew: Vec<WorkerId> = obs
            .workers
            .iter()
            .map(|w| w.id)
            .filter(|w| controller.node_for(*w) == Some(closest))
            .collect();
        assert!(!crew.is_empty());
        let before = controller.current_harvester_count();

        // Same workforce, but the closest node is mined out.
        let survivors: Vec<NodeSnapshot> = three_band_nodes()
            .into_iter()
            .filter(|n| n.id != closest)
            .collect();
        let obs = observation(squad(5), survivors);
        controller.step(&obs, &mut sink);

        let after = controller.current_harvester_count();
        let crew_count = u32::try_from(crew.len()).unwrap_or(u32::MAX);
        assert_eq!(after, before.saturating_sub(crew_count));
        for worker in &crew {
            assert_eq!(controller.node_for(*worker), None);
        }
        // Everyone else kept their node.
        assert!(!controller.nodes().contains(closest));
    }

    #[test]
    fn lost_worker_is_struck_off_and_crews_rebalance() {
        let mut controller = make_controller();
        let mut sink = RecordingSink::new();
        controller.step(&observation(squad(5), three_band_nodes()), &mut sink);
        assert_eq!(controller.current_harvester_count(), 5);

        let mut remaining = squad(5);
        remaining.retain(|w| w.id != WorkerId::new(3));
        controller.step(&observation(remaining, three_band_nodes()), &mut sink);

        assert_eq!(controller.current_harvester_count(), 4);
        assert!(controller.worker_state(WorkerId::new(3)).is_none());
        assert_eq!(controller.node_for(WorkerId::new(3)), None);
    }

    #[test]
    fn danger_freezes_phases_and_nudges_only_idle_assigned_workers() {
        let mut controller = make_controller();
        let mut sink = RecordingSink::new();
        controller.step(&observation(squad(2), three_band_nodes()), &mut sink);
        sink.take();

        // Threatened tick: one worker idle, one suddenly carrying cargo.
        let mut workers = squad(2);
        if let Some(w) = workers.last_mut() {
            w.carrying_cargo = true;
        }
        let mut obs = observation(workers, three_band_nodes());
        obs.danger = true;
        controller.step(&obs, &mut sink);

        // Both workers are idle and assigned: exactly one interact each,
        // aimed at their node.
        let commands = sink.take();
        assert_eq!(commands.len(), 2);
        for command in &commands {
            assert!(matches!(
                command,
                Command::Interact {
                    target: CommandTarget::Node(_),
                    ..
                }
            ));
        }
        // Phase bookkeeping untouched: the cargo pickup was not latched.
        let state = controller.worker_state(WorkerId::new(2));
        assert!(state.is_some_and(|s| !s.had_cargo));

        // The threat clears; the pickup edge now fires normally.
        let mut workers = squad(2);
        if let Some(w) = workers.last_mut() {
            w.carrying_cargo = true;
        }
        controller.step(&observation(workers, three_band_nodes()), &mut sink);
        let state = controller.worker_state(WorkerId::new(2));
        assert!(state.is_some_and(|s| s.harvest == HarvestPhase::ReturningCargo));
    }

    #[test]
    fn delivery_edge_is_counted_once() {
        let mut controller = make_controller();
        let mut sink = RecordingSink::new();
        controller.step(&observation(squad(1), three_band_nodes()), &mut sink);

        // Pickup, then delivery, then an uneventful tick.
        let mut carrying = squad(1);
        if let Some(w) = carrying.first_mut() {
            w.carrying_cargo = true;
        }
        controller.step(&observation(carrying, three_band_nodes()), &mut sink);
        controller.step(&observation(squad(1), three_band_nodes()), &mut sink);
        controller.step(&observation(squad(1), three_band_nodes()), &mut sink);

        assert_eq!(controller.telemetry().deliveries(), 1);
        assert_eq!(controller.telemetry().deliveries_for(WorkerId::new(1)), 1);
    }

    #[test]
    fn arrived_idle_worker_is_told_to_gather() {
        let mut controller = make_controller();
        let mut sink = RecordingSink::new();
        let worker_id = WorkerId::new(1);
        controller.step(&observation(squad(1), three_band_nodes()), &mut sink);
        let assigned = controller.node_for(worker_id);
        assert!(assigned.is_some());
        sink.take();

        // The worker stands right on its node with an empty order queue.
        let node_pos = assigned
            .and_then(|id| controller.nodes().get(id).map(|n| n.pos))
            .unwrap_or_default();
        let arrived = vec![worker(1, node_pos.x, node_pos.y, false)];
        controller.step(&observation(arrived, three_band_nodes()), &mut sink);

        let state = controller.worker_state(worker_id);
        assert!(state.is_some_and(|s| s.harvest == HarvestPhase::GatheringNode));
        let commands = sink.take();
        assert_eq!(commands.len(), 1);
        assert!(matches!(
            commands.first(),
            Some(Command::Interact {
                target: CommandTarget::Node(_),
                ..
            })
        ));
    }
}
