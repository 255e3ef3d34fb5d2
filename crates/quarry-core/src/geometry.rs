//! Pure geometry helpers for waypoint computation.

use quarry_types::Point2;

/// Compute the approach point for a node: the waypoint a worker is steered
/// at so it arrives aligned with the node-to-base axis at near-maximum
/// speed, instead of decelerating onto the node itself.
///
/// Of the node center and its two lateral offsets (`±lateral_offset` on the
/// x axis), the candidate closest to the base wins; that point is then nudged
/// `nudge` units further toward the base. Deterministic, pure function of the
/// two positions. If the chosen candidate already coincides with the base the
/// nudge is skipped.
pub fn approach_point(node: Point2, base: Point2, lateral_offset: f32, nudge: f32) -> Point2 {
    let mut best = node;
    let left = node.offset(-lateral_offset, 0.0);
    let right = node.offset(lateral_offset, 0.0);
    if base.distance_squared_to(best) > base.distance_squared_to(left) {
        best = left;
    }
    if base.distance_squared_to(best) > base.distance_squared_to(right) {
        best = right;
    }
    best.towards(base, nudge)
}

/// Arithmetic mean of a set of positions. `None` when the set is empty.
#[allow(clippy::cast_precision_loss)] // worker counts are tens, exact in f32
pub fn centroid(points: &[Point2]) -> Option<Point2> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f32;
    let (sx, sy) = points
        .iter()
        .fold((0.0_f32, 0.0_f32), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2::new(sx / n, sy / n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point2, b: Point2) -> bool {
        a.distance_to(b) < 1e-4
    }

    #[test]
    fn lateral_candidate_closer_to_base_wins() {
        // Base due west of the node: the -x offset is strictly closer.
        let node = Point2::new(10.0, 0.0);
        let base = Point2::new(0.0, 0.0);
        let spot = approach_point(node, base, 0.25, 0.6);
        // 9.75 laterally, then 0.6 further west.
        assert!(close(spot, Point2::new(9.15, 0.0)));
    }

    #[test]
    fn opposite_side_base_picks_the_other_offset() {
        let node = Point2::new(10.0, 0.0);
        let base = Point2::new(20.0, 0.0);
        let spot = approach_point(node, base, 0.25, 0.6);
        assert!(close(spot, Point2::new(10.85, 0.0)));
    }

    #[test]
    fn base_off_axis_still_nudges_toward_it() {
        let node = Point2::new(4.0, 4.0);
        let base = Point2::new(0.0, 0.0);
        let spot = approach_point(node, base, 0.25, 0.6);
        // The chosen candidate is (3.75, 4.0); the result sits 0.6 units
        // from it along the candidate-to-base direction.
        let candidate = Point2::new(3.75, 4.0);
        assert!((candidate.distance_to(spot) - 0.6).abs() < 1e-4);
        assert!(base.distance_to(spot) < base.distance_to(candidate));
    }

    #[test]
    fn deterministic_for_equal_inputs() {
        let node = Point2::new(7.0, -3.0);
        let base = Point2::new(1.0, 1.0);
        let a = approach_point(node, base, 0.25, 0.6);
        let b = approach_point(node, base, 0.25, 0.6);
        assert!(close(a, b));
    }

    #[test]
    fn node_on_top_of_base_does_not_produce_nan() {
        let p = Point2::new(5.0, 5.0);
        let spot = approach_point(p, p, 0.25, 0.6);
        assert!(spot.x.is_finite());
        assert!(spot.y.is_finite());
    }

    #[test]
    fn centroid_is_the_mean() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(2.0, 6.0),
        ];
        let c = centroid(&points);
        assert_eq!(c, Some(Point2::new(2.0, 2.0)));
    }

    #[test]
    fn centroid_of_nothing_is_none() {
        assert_eq!(centroid(&[]), None);
    }
}
