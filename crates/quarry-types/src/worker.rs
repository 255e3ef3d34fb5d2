//! Per-worker control state tracked by the harvest controller.
//!
//! One [`WorkerState`] record exists per live worker (strict bijection,
//! maintained by the roster). The record is pure bookkeeping: phase
//! transitions and command emission live in `quarry-core`.

use serde::{Deserialize, Serialize};

/// Which leg of the gather loop a worker is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarvestPhase {
    /// In transit toward the assigned resource node.
    MovingToNode,
    /// At the node, actively extracting.
    GatheringNode,
    /// Carrying cargo back to the base.
    ReturningCargo,
}

/// Sub-state of a travel leg.
///
/// `Entering` means the leg was just triggered and no command has been issued
/// for it yet; `Accelerating` means the initial command went out and the leg
/// is under way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelPhase {
    /// Leg triggered, initial command not yet issued.
    Entering,
    /// Initial command issued, worker accelerating toward the waypoint.
    Accelerating,
}

/// Whether a worker's position nearly coincides with another worker's.
///
/// Recomputed every tick from pairwise distances. Overlapping workers are
/// the ones for which ground-targeted commands risk a stall, so policies
/// that re-target the ground can consult this flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapState {
    /// Nearly coincident with at least one other worker.
    Overlapping,
    /// Clear of all other workers.
    Distinct,
}

/// Control state for one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerState {
    /// Current leg of the gather loop.
    pub harvest: HarvestPhase,
    /// Sub-state of the current travel leg.
    pub travel: TravelPhase,
    /// Pairwise-proximity flag, recomputed every tick.
    pub overlap: OverlapState,
    /// Cargo flag observed on the previous tick; the edge detector for
    /// phase transitions.
    pub had_cargo: bool,
}

impl WorkerState {
    /// Initial state for a newly hired worker.
    ///
    /// A worker already carrying cargo starts on the return leg; everyone
    /// else heads for their node. Both start with the travel leg untriggered.
    pub const fn new(carrying_cargo: bool) -> Self {
        let harvest = if carrying_cargo {
            HarvestPhase::ReturningCargo
        } else {
            HarvestPhase::MovingToNode
        };
        Self {
            harvest,
            travel: TravelPhase::Entering,
            overlap: OverlapState::Distinct,
            had_cargo: carrying_cargo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_hire_without_cargo_heads_for_a_node() {
        let state = WorkerState::new(false);
        assert_eq!(state.harvest, HarvestPhase::MovingToNode);
        assert_eq!(state.travel, TravelPhase::Entering);
        assert_eq!(state.overlap, OverlapState::Distinct);
        assert!(!state.had_cargo);
    }

    #[test]
    fn new_hire_with_cargo_returns_first() {
        let state = WorkerState::new(true);
        assert_eq!(state.harvest, HarvestPhase::ReturningCargo);
        assert_eq!(state.travel, TravelPhase::Entering);
        assert!(state.had_cargo);
    }
}
