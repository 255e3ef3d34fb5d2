//! Worker roster: the bijection between live workers and control records.
//!
//! Each tick the roster reconciles the observed live worker set against its
//! tracked records: unknown workers are hired (a fresh [`WorkerState`] is
//! created), vanished workers are struck off, and the pairwise overlap flags
//! are recomputed from scratch. The roster never touches assignments itself;
//! it reports what changed and the controller reacts.

use std::collections::{BTreeMap, BTreeSet};

use quarry_types::{OverlapState, WorkerId, WorkerSnapshot, WorkerState};
use tracing::debug;

/// What a reconcile pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterChange {
    /// Workers hired this pass.
    pub added: Vec<WorkerId>,
    /// Workers struck off this pass.
    pub removed: Vec<WorkerId>,
}

impl RosterChange {
    /// Whether anything changed.
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Tracked control records for the live workers of one base.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    states: BTreeMap<WorkerId, WorkerState>,
}

impl Roster {
    /// Empty roster.
    pub const fn new() -> Self {
        Self {
            states: BTreeMap::new(),
        }
    }

    /// Reconcile tracked records against the observed live set.
    ///
    /// Creates a record for every observed worker that has none (cargo
    /// carriers start on the return leg), and removes the record of every
    /// tracked worker absent from `live`. The strict record/worker bijection
    /// holds when this returns.
    pub fn reconcile(&mut self, live: &[WorkerSnapshot]) -> RosterChange {
        let mut change = RosterChange::default();

        for snap in live {
            if !self.states.contains_key(&snap.id) {
                self.states
                    .insert(snap.id, WorkerState::new(snap.carrying_cargo));
                change.added.push(snap.id);
            }
        }

        let observed: BTreeSet<WorkerId> = live.iter().map(|w| w.id).collect();
        let gone: Vec<WorkerId> = self
            .states
            .keys()
            .filter(|id| !observed.contains(id))
            .copied()
            .collect();
        for id in &gone {
            self.states.remove(id);
            change.removed.push(*id);
        }

        if change.changed() {
            debug!(
                added = change.added.len(),
                removed = change.removed.len(),
                tracked = self.states.len(),
                "roster reconciled"
            );
        }
        change
    }

    /// Recompute every worker's overlap flag from pairwise distances.
    ///
    /// Two workers overlap when their squared distance is below the squared
    /// pair threshold, `overlap_factor` times the mean of the two radii.
    /// Every strict pair is checked (a worker never overlaps itself); flags
    /// from previous ticks are discarded.
    pub fn mark_overlaps(&mut self, live: &[WorkerSnapshot], overlap_factor: f32) {
        for state in self.states.values_mut() {
            state.overlap = OverlapState::Distinct;
        }

        for (i, a) in live.iter().enumerate() {
            for b in live.iter().skip(i.saturating_add(1)) {
                let threshold = (a.radius + b.radius) * 0.5 * overlap_factor;
                if a.pos.distance_squared_to(b.pos) < threshold * threshold {
                    if let Some(state) = self.states.get_mut(&a.id) {
                        state.overlap = OverlapState::Overlapping;
                    }
                    if let Some(state) = self.states.get_mut(&b.id) {
                        state.overlap = OverlapState::Overlapping;
                    }
                }
            }
        }
    }

    /// Look up a worker's control record.
    pub fn get(&self, id: WorkerId) -> Option<&WorkerState> {
        self.states.get(&id)
    }

    /// Mutable access to a worker's control record.
    pub fn get_mut(&mut self, id: WorkerId) -> Option<&mut WorkerState> {
        self.states.get_mut(&id)
    }

    /// Whether a record exists for `id`.
    pub fn contains(&self, id: WorkerId) -> bool {
        self.states.contains_key(&id)
    }

    /// Tracked worker identifiers, ascending.
    pub fn ids(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.states.keys().copied()
    }

    /// Number of tracked workers.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
