//! Scripted kinematic world and the scenario run loop.
//!
//! The world is deliberately simple: workers walk in straight lines at a
//! fixed speed, gathering takes a fixed number of ticks in contact with a
//! node, and delivery happens within a radius of the base. No pathfinding,
//! no collision. It exists to exercise the controller end-to-end: every
//! tick the world is observed, the coordinator steps, and the emitted
//! commands become worker orders for the next physics step.
//!
//! Order semantics mirror what the controller expects from an engine:
//! an interact aimed at a node gathers (and auto-returns to the nearest
//! base once loaded), aimed at a base it delivers (and auto-returns to the
//! last node), aimed at a point it walks there. A fresh command always
//! replaces the current order.

use std::collections::BTreeMap;

use quarry_core::command::RecordingSink;
use quarry_core::config::HarvestConfig;
use quarry_core::coordinator::HarvestCoordinator;
use quarry_core::error::ControlError;
use quarry_core::telemetry::TelemetryReport;
use quarry_types::{
    BaseId, BaseSite, Command, CommandTarget, NodeId, NodeSnapshot, OrderKind, OrderTarget,
    PendingOrder, Point2, WorkerId, WorkerSnapshot, WorldObservation,
};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;
use tracing::{debug, info};

/// A worker standing closer than this to a node is in gathering contact.
const CONTACT_RANGE: f32 = 1.0;

/// Outcome of a finished scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Deliveries across all bases.
    pub deliveries: u64,
    /// Nodes still holding resources at the end.
    pub nodes_remaining: u64,
    /// Per-base counters.
    pub bases: Vec<BaseSummary>,
}

/// Per-base slice of the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct BaseSummary {
    /// The base these counters belong to.
    pub base: BaseId,
    /// Workforce size the base's nodes support, reserve included.
    pub ideal_harvesters: u32,
    /// Workers assigned at the end of the run.
    pub current_harvesters: u32,
    /// Delivery and trip counters.
    pub report: TelemetryReport,
}

/// What a sim worker is currently doing.
#[derive(Debug, Clone, Copy)]
enum SimOrder {
    /// Context-sensitive order from the controller (or an auto-return).
    Interact(CommandTarget),
    /// Plain movement order.
    MoveTo(Point2),
}

#[derive(Debug, Clone)]
struct SimWorker {
    pos: Point2,
    carrying: bool,
    order: Option<SimOrder>,
    gather_progress: u32,
    last_node: Option<NodeId>,
}

#[derive(Debug, Clone, Copy)]
struct SimNode {
    pos: Point2,
    remaining: u32,
}

/// The scripted world: bases, nodes, workers, and their physics.
#[derive(Debug)]
pub struct SimWorld {
    bases: Vec<BaseSite>,
    nodes: BTreeMap<NodeId, SimNode>,
    workers: BTreeMap<WorkerId, SimWorker>,
    /// Per-base node sets as registered with the coordinator.
    layout: Vec<(BaseSite, Vec<NodeSnapshot>)>,
    worker_speed: f32,
    worker_radius: f32,
    gather_ticks: u32,
    node_yield: u32,
    deliver_radius: f32,
}

impl SimWorld {
    /// Build the world described by the scenario section of the config.
    ///
    /// Workers spawn round-robin across the bases, jittered around the base
    /// position so they do not stack on one spot.
    pub fn from_scenario(config: &HarvestConfig) -> Self {
        let scenario = &config.scenario;
        let mut rng = SmallRng::seed_from_u64(scenario.seed);

        let mut bases = Vec::new();
        let mut nodes = BTreeMap::new();
        let mut layout = Vec::new();
        let mut next_base: u64 = 1;
        let mut next_node: u64 = 1;

        for scenario_base in &scenario.bases {
            let site = BaseSite {
                id: BaseId::new(next_base),
                pos: Point2::new(scenario_base.x, scenario_base.y),
            };
            next_base = next_base.saturating_add(1);

            let mut snapshots = Vec::new();
            for scenario_node in &scenario_base.nodes {
                let snapshot = NodeSnapshot {
                    id: NodeId::new(next_node),
                    pos: Point2::new(scenario_node.x, scenario_node.y),
                    remaining: scenario_node.amount,
                };
                next_node = next_node.saturating_add(1);
                nodes.insert(
                    snapshot.id,
                    SimNode {
                        pos: snapshot.pos,
                        remaining: snapshot.remaining,
                    },
                );
                snapshots.push(snapshot);
            }

            bases.push(site);
            layout.push((site, snapshots));
        }

        let mut workers = BTreeMap::new();
        let mut next_worker: u64 = 1;
        let mut spawn_points = bases.iter().cycle();
        for _ in 0..scenario.workers {
            let around = spawn_points.next().map_or_else(Point2::default, |b| b.pos);
            let jitter_x: f32 = rng.random_range(-2.0..2.0);
            let jitter_y: f32 = rng.random_range(-2.0..2.0);
            workers.insert(
                WorkerId::new(next_worker),
                SimWorker {
                    pos: around.offset(jitter_x, jitter_y),
                    carrying: false,
                    order: None,
                    gather_progress: 0,
                    last_node: None,
                },
            );
            next_worker = next_worker.saturating_add(1);
        }

        Self {
            bases,
            nodes,
            workers,
            layout,
            worker_speed: scenario.worker_speed,
            worker_radius: scenario.worker_radius,
            gather_ticks: scenario.gather_ticks,
            node_yield: scenario.node_yield,
            deliver_radius: scenario.deliver_radius,
        }
    }

    /// The bases and their node sets, for coordinator registration.
    pub fn layout(&self) -> &[(BaseSite, Vec<NodeSnapshot>)] {
        &self.layout
    }

    /// Number of nodes still holding resources.
    pub fn nodes_remaining(&self) -> u64 {
        u64::try_from(self.nodes.len()).unwrap_or(u64::MAX)
    }

    /// Snapshot everything the coordinator is allowed to see.
    pub fn observe(&self) -> WorldObservation {
        WorldObservation {
            live_bases: self.bases.iter().map(|b| b.id).collect(),
            danger: false,
            workers: self
                .workers
                .iter()
                .map(|(id, worker)| WorkerSnapshot {
                    id: *id,
                    pos: worker.pos,
                    radius: self.worker_radius,
                    carrying_cargo: worker.carrying,
                    orders: worker.order.map_or_else(Vec::new, |o| vec![pending_order(o)]),
                })
                .collect(),
            nodes: self
                .nodes
                .iter()
                .map(|(id, node)| NodeSnapshot {
                    id: *id,
                    pos: node.pos,
                    remaining: node.remaining,
                })
                .collect(),
        }
    }

    /// Replace worker orders with the commands the controller emitted.
    pub fn apply(&mut self, commands: &[Command]) {
        for command in commands {
            match *command {
                Command::Interact { worker, target } => {
                    if let Some(state) = self.workers.get_mut(&worker) {
                        state.order = Some(SimOrder::Interact(target));
                        state.gather_progress = 0;
                    }
                }
                Command::Move { worker, point } => {
                    if let Some(state) = self.workers.get_mut(&worker) {
                        state.order = Some(SimOrder::MoveTo(point));
                    }
                }
            }
        }
    }

    /// One physics step: every worker acts on its order, depleted nodes
    /// vanish.
    pub fn advance(&mut self) {
        let ids: Vec<WorkerId> = self.workers.keys().copied().collect();
        for id in ids {
            let Some(order) = self.workers.get(&id).and_then(|w| w.order) else {
                continue;
            };
            match order {
                SimOrder::MoveTo(point) | SimOrder::Interact(CommandTarget::Point(point)) => {
                    self.walk_step(id, point);
                }
                SimOrder::Interact(CommandTarget::Node(node)) => self.gather_step(id, node),
                SimOrder::Interact(CommandTarget::Base(base)) => self.deliver_step(id, base),
            }
        }
        self.nodes.retain(|_, node| node.remaining > 0);
    }

    /// Walk toward a ground point; the order completes on arrival.
    fn walk_step(&mut self, id: WorkerId, target: Point2) {
        let speed = self.worker_speed;
        let Some(worker) = self.workers.get_mut(&id) else {
            return;
        };
        if worker.pos.distance_to(target) <= speed {
            worker.pos = target;
            worker.order = None;
        } else {
            worker.pos = worker.pos.towards(target, speed);
        }
    }

    /// Walk into contact with the node, then gather until loaded.
    fn gather_step(&mut self, id: WorkerId, node_id: NodeId) {
        let Some(node_pos) = self.nodes.get(&node_id).map(|n| n.pos) else {
            if let Some(worker) = self.workers.get_mut(&id) {
                worker.order = None;
            }
            return;
        };
        let speed = self.worker_speed;
        let gather_ticks = self.gather_ticks;
        let home = self.nearest_base(node_pos);

        let Some(worker) = self.workers.get_mut(&id) else {
            return;
        };
        if worker.pos.distance_to(node_pos) > CONTACT_RANGE {
            worker.pos = worker.pos.towards(node_pos, speed);
            worker.gather_progress = 0;
            return;
        }
        if worker.carrying {
            return;
        }

        worker.gather_progress = worker.gather_progress.saturating_add(1);
        if worker.gather_progress >= gather_ticks {
            worker.gather_progress = 0;
            worker.carrying = true;
            worker.last_node = Some(node_id);
            worker.order = home.map(|b| SimOrder::Interact(CommandTarget::Base(b)));
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.remaining = node.remaining.saturating_sub(self.node_yield);
            }
        }
    }

    /// Walk to the base; within the delivery radius the cargo drops and the
    /// worker auto-returns to its last node.
    fn deliver_step(&mut self, id: WorkerId, base_id: BaseId) {
        let Some(base_pos) = self
            .bases
            .iter()
            .find(|b| b.id == base_id)
            .map(|b| b.pos)
        else {
            if let Some(worker) = self.workers.get_mut(&id) {
                worker.order = None;
            }
            return;
        };
        let speed = self.worker_speed;
        let deliver_radius = self.deliver_radius;

        let Some(worker) = self.workers.get_mut(&id) else {
            return;
        };
        if worker.pos.distance_to(base_pos) > deliver_radius {
            worker.pos = worker.pos.towards(base_pos, speed);
            return;
        }
        worker.carrying = false;
        worker.order = worker
            .last_node
            .map(|node| SimOrder::Interact(CommandTarget::Node(node)));
    }

    fn nearest_base(&self, pos: Point2) -> Option<BaseId> {
        self.bases
            .iter()
            .min_by(|a, b| {
                pos.distance_squared_to(a.pos)
                    .total_cmp(&pos.distance_squared_to(b.pos))
            })
            .map(|b| b.id)
    }
}

/// How a sim order shows up in the worker's observed order queue.
fn pending_order(order: SimOrder) -> PendingOrder {
    match order {
        SimOrder::Interact(CommandTarget::Node(node)) => PendingOrder {
            kind: OrderKind::Gather,
            target: Some(OrderTarget::Node(node)),
        },
        SimOrder::Interact(CommandTarget::Base(base)) => PendingOrder {
            kind: OrderKind::DeliverCargo,
            target: Some(OrderTarget::Base(base)),
        },
        SimOrder::Interact(CommandTarget::Point(point)) | SimOrder::MoveTo(point) => PendingOrder {
            kind: OrderKind::Move,
            target: Some(OrderTarget::Point(point)),
        },
    }
}

/// Run the scenario described by `config` from start to finish.
///
/// # Errors
///
/// Returns [`ControlError`] if base registration fails, which with
/// generated sequential identifiers means a malformed scenario.
pub fn run(config: &HarvestConfig) -> Result<RunSummary, ControlError> {
    let mut world = SimWorld::from_scenario(config);
    let mut coordinator = HarvestCoordinator::new(config.tuning.clone());
    for (site, nodes) in world.layout() {
        coordinator.register_base(*site, nodes)?;
    }
    info!(
        bases = coordinator.len(),
        nodes = world.nodes_remaining(),
        workers = config.scenario.workers,
        ideal_harvesters = coordinator.ideal_harvester_count(),
        "world built"
    );

    let mut sink = RecordingSink::new();
    for tick in 0..config.scenario.ticks {
        let observation = world.observe();
        coordinator.step(&observation, &mut sink);
        let commands = sink.take();
        if config.logging.log_commands {
            for command in &commands {
                debug!(tick, ?command, "command");
            }
        }
        world.apply(&commands);
        world.advance();
    }

    let mut deliveries: u64 = 0;
    let mut bases = Vec::new();
    for (id, controller) in coordinator.controllers() {
        let report = controller.telemetry().report();
        deliveries = deliveries.saturating_add(report.deliveries);
        bases.push(BaseSummary {
            base: id,
            ideal_harvesters: controller.ideal_harvester_count(),
            current_harvesters: controller.current_harvester_count(),
            report,
        });
    }

    Ok(RunSummary {
        ticks: config.scenario.ticks,
        deliveries,
        nodes_remaining: world.nodes_remaining(),
        bases,
    })
}
