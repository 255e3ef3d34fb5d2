//! Delivery and round-trip accounting for one base controller.
//!
//! Fed from the cargo-edge detector: every delivery edge lands here with the
//! tick it happened on. Trip durations are measured delivery to delivery, so
//! a worker's first delivery only seeds the baseline and produces no trip.

use std::collections::BTreeMap;

use quarry_types::WorkerId;
use serde::Serialize;

/// Snapshot of the counters, suitable for logging or a run summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryReport {
    /// Total deliveries recorded.
    pub deliveries: u64,
    /// Completed round trips (deliveries with a measurable predecessor).
    pub completed_trips: u64,
    /// Mean round-trip duration in ticks.
    pub mean_trip_ticks: Option<f64>,
    /// Mean with outliers beyond twice the raw mean excluded.
    pub trimmed_mean_trip_ticks: Option<f64>,
}

/// Accumulating delivery counters for one base.
#[derive(Debug, Clone, Default)]
pub struct HarvestTelemetry {
    deliveries: u64,
    trips: Vec<u32>,
    last_delivery_tick: BTreeMap<WorkerId, u64>,
    last_trip_ticks: BTreeMap<WorkerId, u32>,
    per_worker: BTreeMap<WorkerId, u64>,
}

impl HarvestTelemetry {
    /// Empty counters.
    pub const fn new() -> Self {
        Self {
            deliveries: 0,
            trips: Vec::new(),
            last_delivery_tick: BTreeMap::new(),
            last_trip_ticks: BTreeMap::new(),
            per_worker: BTreeMap::new(),
        }
    }

    /// Record that `worker` dropped cargo at the base on `tick`.
    pub fn record_delivery(&mut self, worker: WorkerId, tick: u64) {
        self.deliveries = self.deliveries.saturating_add(1);
        let count = self.per_worker.entry(worker).or_insert(0);
        *count = count.saturating_add(1);

        if let Some(prev) = self.last_delivery_tick.insert(worker, tick) {
            let trip = u32::try_from(tick.saturating_sub(prev)).unwrap_or(u32::MAX);
            self.trips.push(trip);
            self.last_trip_ticks.insert(worker, trip);
        }
    }

    /// Drop the timing state of a departed worker.
    ///
    /// Historical delivery counts are kept; only the delivery-to-delivery
    /// baseline is cleared, so a returning worker with the same tag starts
    /// a fresh measurement instead of one spanning its absence.
    pub fn forget(&mut self, worker: WorkerId) {
        self.last_delivery_tick.remove(&worker);
        self.last_trip_ticks.remove(&worker);
    }

    /// Total deliveries recorded so far.
    pub const fn deliveries(&self) -> u64 {
        self.deliveries
    }

    /// Deliveries credited to `worker`.
    pub fn deliveries_for(&self, worker: WorkerId) -> u64 {
        self.per_worker.get(&worker).copied().unwrap_or(0)
    }

    /// Duration of `worker`'s most recent completed trip, in ticks.
    pub fn last_trip_for(&self, worker: WorkerId) -> Option<u32> {
        self.last_trip_ticks.get(&worker).copied()
    }

    /// Mean round-trip duration across all completed trips.
    pub fn mean_trip_ticks(&self) -> Option<f64> {
        Self::mean_of(self.trips.iter().copied())
    }

    /// Mean round-trip duration with gross outliers excluded.
    ///
    /// A trip longer than twice the raw mean usually means the worker was
    /// re-assigned or idled mid-trip; those samples say nothing about the
    /// route itself, so they are dropped before averaging.
    pub fn trimmed_mean_trip_ticks(&self) -> Option<f64> {
        let mean = self.mean_trip_ticks()?;
        let cutoff = mean * 2.0;
        let trimmed = Self::mean_of(
            self.trips
                .iter()
                .copied()
                .filter(|t| f64::from(*t) <= cutoff),
        );
        trimmed.or(Some(mean))
    }

    /// Snapshot the counters.
    pub fn report(&self) -> TelemetryReport {
        TelemetryReport {
            deliveries: self.deliveries,
            completed_trips: u64::try_from(self.trips.len()).unwrap_or(u64::MAX),
            mean_trip_ticks: self.mean_trip_ticks(),
            trimmed_mean_trip_ticks: self.trimmed_mean_trip_ticks(),
        }
    }

    fn mean_of(samples: impl Iterator<Item = u32>) -> Option<f64> {
        let mut sum = 0.0_f64;
        let mut count = 0_u32;
        for sample in samples {
            sum += f64::from(sample);
            count = count.saturating_add(1);
        }
        if count == 0 {
            return None;
        }
        Some(sum / f64::from(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_delivery_only_seeds_the_baseline() {
        let mut telemetry = HarvestTelemetry::new();
        telemetry.record_delivery(WorkerId::new(1), 100);

        assert_eq!(telemetry.deliveries(), 1);
        assert_eq!(telemetry.mean_trip_ticks(), None);
        assert_eq!(telemetry.last_trip_for(WorkerId::new(1)), None);
    }

    #[test]
    fn trips_are_measured_delivery_to_delivery() {
        let mut telemetry = HarvestTelemetry::new();
        let worker = WorkerId::new(1);
        telemetry.record_delivery(worker, 100);
        telemetry.record_delivery(worker, 160);

        assert_eq!(telemetry.deliveries(), 2);
        assert_eq!(telemetry.last_trip_for(worker), Some(60));
        assert!(telemetry.mean_trip_ticks().is_some_and(|m| close(m, 60.0)));
    }

    #[test]
    fn per_worker_counts_accumulate() {
        let mut telemetry = HarvestTelemetry::new();
        telemetry.record_delivery(WorkerId::new(1), 10);
        telemetry.record_delivery(WorkerId::new(1), 80);
        telemetry.record_delivery(WorkerId::new(2), 90);

        assert_eq!(telemetry.deliveries_for(WorkerId::new(1)), 2);
        assert_eq!(telemetry.deliveries_for(WorkerId::new(2)), 1);
        assert_eq!(telemetry.deliveries_for(WorkerId::new(3)), 0);
    }

    #[test]
    fn trimmed_mean_drops_gross_outliers() {
        let mut telemetry = HarvestTelemetry::new();
        let steady = WorkerId::new(1);
        // Four 50-tick trips.
        for tick in [10, 60, 110, 160, 210] {
            telemetry.record_delivery(steady, tick);
        }
        // One 500-tick trip from a worker that idled mid-route.
        let straggler = WorkerId::new(2);
        telemetry.record_delivery(straggler, 0);
        telemetry.record_delivery(straggler, 500);

        // Raw mean is 140; the 500-tick sample exceeds twice that.
        assert!(telemetry.mean_trip_ticks().is_some_and(|m| close(m, 140.0)));
        assert!(
            telemetry
                .trimmed_mean_trip_ticks()
                .is_some_and(|m| close(m, 50.0))
        );
    }

    #[test]
    fn forget_reseeds_the_baseline() {
        let mut telemetry = HarvestTelemetry::new();
        let worker = WorkerId::new(1);
        telemetry.record_delivery(worker, 10);
        telemetry.forget(worker);
        telemetry.record_delivery(worker, 400);

        // No trip spans the absence.
        assert_eq!(telemetry.mean_trip_ticks(), None);
        assert_eq!(telemetry.deliveries_for(worker), 2);
    }

    #[test]
    fn report_snapshots_all_counters() {
        let mut telemetry = HarvestTelemetry::new();
        let worker = WorkerId::new(1);
        telemetry.record_delivery(worker, 100);
        telemetry.record_delivery(worker, 150);

        let report = telemetry.report();
        assert_eq!(report.deliveries, 2);
        assert_eq!(report.completed_trips, 1);
        assert!(report.mean_trip_ticks.is_some_and(|m| close(m, 50.0)));
    }
}
