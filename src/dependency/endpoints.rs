//! Anchor points of a dependency line between two node circles.

use crate::geometry::{Circle, Vector};
use serde::Serialize;

/// Distance between the two parallel lines of a mutual dependency
pub const LINE_DISTANCE: f64 = 20.0;

/// Absolute start and end point of a dependency line
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub start_point: Vector,
    pub end_point: Vector,
}

pub fn one_circle_is_completely_within_the_other(a: &Circle, b: &Circle) -> bool {
    a.center.distance_to(b.center) + a.r.min(b.r) < a.r.max(b.r)
}

/// Compute where a line from `start` to `end` touches the two circles.
///
/// For circles side by side the points face each other. If one circle lies
/// within the other, both points face the same direction so the line runs
/// from the smaller circle outwards to the rim of the larger one. With
/// `must_share_nodes` both points are shifted sideways by half the
/// [`LINE_DISTANCE`], so that the lines of `a -> b` and `b -> a` do not overlap.
pub fn calculate_endpoints(must_share_nodes: bool, start: &Circle, end: &Circle) -> Endpoints {
    let contained = one_circle_is_completely_within_the_other(start, end);
    // Ties go to argument order: on equal radii `start` is the smaller one
    let start_is_smaller = start.r <= end.r;
    let start_is_larger = !start_is_smaller;

    let direction = Vector::between(start.center, end.center).or_default_if_null();
    let mut start_direction = direction.revert_if(contained && start_is_smaller);
    let mut end_direction = start_direction.revert_if(!contained);

    if must_share_nodes {
        let offset = start_direction
            .orthogonal()
            .norm(LINE_DISTANCE / 2.0)
            .revert_if(contained && start_is_larger);
        start_direction = start_direction.norm(start.r).add(offset);
        end_direction = end_direction.norm(end.r).add(offset);
    }

    Endpoints {
        start_point: start.center.add(start_direction.norm(start.r)),
        end_point: end.center.add(end_direction.norm(end.r)),
    }
}
