//! Multi-base coordination: routing workers to per-base controllers.
//!
//! The coordinator owns one [`BaseController`] per registered base and a
//! worker-to-base routing table. Each tick it reroutes workers whose base
//! vanished, sends new arrivals to the base with the largest workforce
//! deficit, then splits the world observation into per-base observations
//! and steps every controller.

use std::collections::{BTreeMap, BTreeSet};

use quarry_types::{BaseId, BaseSite, NodeSnapshot, Observation, WorkerId, WorldObservation};
use tracing::{debug, info};

use crate::command::CommandSink;
use crate::config::Tuning;
use crate::controller::BaseController;
use crate::error::ControlError;

/// Routes workers across every registered base.
#[derive(Debug)]
pub struct HarvestCoordinator {
    tuning: Tuning,
    bases: BTreeMap<BaseId, BaseController>,
    worker_bases: BTreeMap<WorkerId, BaseId>,
}

impl HarvestCoordinator {
    /// Coordinator with no bases registered.
    pub const fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            bases: BTreeMap::new(),
            worker_bases: BTreeMap::new(),
        }
    }

    /// Register `base` and the nodes it harvests from.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::DuplicateBase`] if the base is already
    /// registered.
    pub fn register_base(
        &mut self,
        base: BaseSite,
        nodes: &[NodeSnapshot],
    ) -> Result<(), ControlError> {
        if self.bases.contains_key(&base.id) {
            return Err(ControlError::DuplicateBase { base: base.id });
        }
        let controller = BaseController::new(base, nodes, self.tuning.clone());
        self.bases.insert(base.id, controller);
        info!(base = %base.id, total = self.bases.len(), "base registered");
        Ok(())
    }

    /// Drop `base` and unroute every worker attached to it.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::UnknownBase`] if no such base is registered.
    pub fn remove_base(&mut self, base: BaseId) -> Result<(), ControlError> {
        if self.bases.remove(&base).is_none() {
            return Err(ControlError::UnknownBase { base });
        }
        self.worker_bases.retain(|_, b| *b != base);
        info!(base = %base, total = self.bases.len(), "base removed");
        Ok(())
    }

    /// Run one coordination tick: refresh routing, then step every base.
    pub fn step(&mut self, observation: &WorldObservation, sink: &mut dyn CommandSink) {
        self.route_workers(observation);

        // Split the live workers by their routed base.
        let mut per_base: BTreeMap<BaseId, Vec<_>> = BTreeMap::new();
        for snap in &observation.workers {
            if let Some(base) = self.worker_bases.get(&snap.id) {
                per_base.entry(*base).or_default().push(snap.clone());
            }
        }

        for (id, controller) in &mut self.bases {
            let local = Observation {
                base_alive: observation.base_is_alive(*id),
                danger: observation.danger,
                workers: per_base.remove(id).unwrap_or_default(),
                nodes: observation.nodes.clone(),
            };
            controller.step(&local, sink);
        }
    }

    /// Reroute workers whose base vanished; route new arrivals to the base
    /// with the largest workforce deficit (ideal minus current, pending
    /// routes from this pass included). Ties go to the lowest base
    /// identifier. Workers stay unrouted while no registered base is alive.
    fn route_workers(&mut self, observation: &WorldObservation) {
        let live: BTreeSet<WorkerId> = observation.workers.iter().map(|w| w.id).collect();
        self.worker_bases.retain(|w, _| live.contains(w));

        let mut pending: BTreeMap<BaseId, u32> = BTreeMap::new();
        for snap in &observation.workers {
            let routed_ok = self.worker_bases.get(&snap.id).is_some_and(|base| {
                self.bases.contains_key(base) && observation.base_is_alive(*base)
            });
            if routed_ok {
                continue;
            }
            let Some(target) = self.neediest_base(observation, &pending) else {
                continue;
            };
            self.worker_bases.insert(snap.id, target);
            let slot = pending.entry(target).or_insert(0);
            *slot = slot.saturating_add(1);
            debug!(worker = %snap.id, base = %target, "worker routed");
        }
    }

    fn neediest_base(
        &self,
        observation: &WorldObservation,
        pending: &BTreeMap<BaseId, u32>,
    ) -> Option<BaseId> {
        let mut best: Option<(i64, BaseId)> = None;
        for (id, controller) in &self.bases {
            if !observation.base_is_alive(*id) {
                continue;
            }
            let claimed = controller
                .current_harvester_count()
                .saturating_add(pending.get(id).copied().unwrap_or(0));
            let deficit =
                i64::from(controller.ideal_harvester_count()).saturating_sub(i64::from(claimed));
            if best.is_none_or(|(d, _)| deficit > d) {
                best = Some((deficit, *id));
            }
        }
        best.map(|(_, id)| id)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Sum of every registered base's ideal workforce size.
    pub fn ideal_harvester_count(&self) -> u32 {
        self.bases
            .values()
            .fold(0_u32, |acc, c| acc.saturating_add(c.ideal_harvester_count()))
    }

    /// Sum of every registered base's assigned-worker count.
    pub fn current_harvester_count(&self) -> u32 {
        self.bases.values().fold(0_u32, |acc, c| {
            acc.saturating_add(c.current_harvester_count())
        })
    }

    /// The base `worker` is currently routed to.
    pub fn base_for(&self, worker: WorkerId) -> Option<BaseId> {
        self.worker_bases.get(&worker).copied()
    }

    /// The controller for `base`.
    pub fn controller(&self, base: BaseId) -> Option<&BaseController> {
        self.bases.get(&base)
    }

    /// Iterate every registered base controller, ascending by base.
    pub fn controllers(&self) -> impl Iterator<Item = (BaseId, &BaseController)> {
        self.bases.iter().map(|(id, c)| (*id, c))
    }

    /// Number of registered bases.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Whether no base is registered.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}
