use crate::route::geometry::{self, RoutePoint};
use crate::route::options::ReplayRouteOptions;

/// Turn angle at which the vehicle slows all the way to u-turn speed.
const U_TURN_ANGLE_DEGREES: f64 = 150.0;
/// Turn angle at which the vehicle slows to turn speed.
const TURN_ANGLE_DEGREES: f64 = 90.0;

/// A point on the route with its target speed, before interpolation.
///
/// Checkpoints are what the braking pass and the integrator work over; the
/// integrator then emits one [`ReplayRouteLocation`] per simulated second
/// between them.
#[derive(Debug, Clone, Copy)]
pub struct SpeedCheckpoint {
    pub point: RoutePoint,
    /// Cumulative distance from the route start, meters.
    pub cumulative_distance: f64,
    pub speed_mps: f64,
}

/// One simulated location emitted by the kinematics engine.
///
/// Appended progressively during interpolation; only `bearing` is
/// back-filled afterwards, once the neighboring points needed for look-ahead
/// smoothing exist.
#[derive(Debug, Clone)]
pub struct ReplayRouteLocation {
    /// Index of the profile checkpoint this step was emitted toward.
    pub route_index: usize,
    pub point: RoutePoint,
    /// Cumulative distance from the route start, meters.
    pub distance_meters: f64,
    pub speed_mps: f64,
    /// Degrees clockwise from north. Back-filled by the bearing pass.
    pub bearing: f64,
    /// Simulated seconds since the first location.
    pub time_offset_secs: f64,
}

/// Target speed through a turn of the given angle.
///
/// 0 degrees drives at cruise speed, 90 degrees at turn speed, and 150
/// degrees or more at u-turn speed, with linear interpolation between the
/// anchors.
pub fn speed_for_turn(options: &ReplayRouteOptions, turn_angle_degrees: f64) -> f64 {
    let angle = turn_angle_degrees.abs();
    if angle >= U_TURN_ANGLE_DEGREES {
        options.u_turn_speed_mps
    } else if angle >= TURN_ANGLE_DEGREES {
        let t = (angle - TURN_ANGLE_DEGREES) / (U_TURN_ANGLE_DEGREES - TURN_ANGLE_DEGREES);
        options.turn_speed_mps + (options.u_turn_speed_mps - options.turn_speed_mps) * t
    } else {
        let t = angle / TURN_ANGLE_DEGREES;
        options.max_speed_mps + (options.turn_speed_mps - options.max_speed_mps) * t
    }
}

/// Distance needed to change speed from `from_mps` to `to_mps` under the
/// given (negative) braking acceleration. Positive when slowing down.
pub fn braking_distance(from_mps: f64, to_mps: f64, min_acceleration_mps2: f64) -> f64 {
    (to_mps * to_mps - from_mps * from_mps) / (2.0 * min_acceleration_mps2)
}

/// Assign a target speed to every vertex of a smoothed route.
///
/// The first and last checkpoints are pinned at zero; interior checkpoints
/// slow down proportionally to the turn angle at the vertex.
pub fn assign_checkpoint_speeds(
    points: &[RoutePoint],
    options: &ReplayRouteOptions,
) -> Vec<SpeedCheckpoint> {
    let cumulative = geometry::cumulative_distances(points);
    let mut checkpoints = Vec::with_capacity(points.len());

    for (i, &point) in points.iter().enumerate() {
        let speed_mps = if i == 0 || i == points.len() - 1 {
            0.0
        } else {
            let inbound = geometry::bearing(points[i - 1], point);
            let outbound = geometry::bearing(point, points[i + 1]);
            let turn_angle = geometry::bearing_delta(inbound, outbound);
            speed_for_turn(options, turn_angle)
        };
        checkpoints.push(SpeedCheckpoint {
            point,
            cumulative_distance: cumulative[i],
            speed_mps,
        });
    }
    checkpoints
}

/// Lower upstream checkpoint speeds until every slow-down fits its run-way.
///
/// Walks backward from the end: if a checkpoint would need more distance to
/// brake down to its successor than the segment provides, its own target is
/// capped at the highest speed that still brakes in time. One backward pass
/// settles the whole profile because each cap only depends on the already
/// settled successor.
pub fn apply_braking_lookahead(
    checkpoints: &mut [SpeedCheckpoint],
    options: &ReplayRouteOptions,
) {
    for i in (0..checkpoints.len().saturating_sub(1)).rev() {
        let run_way = checkpoints[i + 1].cumulative_distance - checkpoints[i].cumulative_distance;
        let target = checkpoints[i + 1].speed_mps;
        if checkpoints[i].speed_mps <= target {
            continue;
        }
        let needed = braking_distance(checkpoints[i].speed_mps, target, options.min_acceleration_mps2);
        if needed > run_way {
            // Highest entry speed that still reaches `target` within run_way.
            let reachable =
                (target * target - 2.0 * options.min_acceleration_mps2 * run_way).sqrt();
            checkpoints[i].speed_mps = reachable.min(checkpoints[i].speed_mps);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_route() -> Vec<RoutePoint> {
        vec![
            RoutePoint::new(0.0, 0.0),
            RoutePoint::new(0.0, 0.01),
            RoutePoint::new(0.0, 0.02),
        ]
    }

    #[test]
    fn test_speed_for_turn_anchors() {
        let options = ReplayRouteOptions::default();
        assert_eq!(speed_for_turn(&options, 0.0), options.max_speed_mps);
        assert_eq!(speed_for_turn(&options, 90.0), options.turn_speed_mps);
        assert_eq!(speed_for_turn(&options, 150.0), options.u_turn_speed_mps);
        assert_eq!(speed_for_turn(&options, 170.0), options.u_turn_speed_mps);
    }

    #[test]
    fn test_speed_for_turn_interpolates() {
        let options = ReplayRouteOptions::default();
        let mid = speed_for_turn(&options, 45.0);
        assert!(mid < options.max_speed_mps && mid > options.turn_speed_mps);
        let sharp = speed_for_turn(&options, 120.0);
        assert!(sharp < options.turn_speed_mps && sharp > options.u_turn_speed_mps);
    }

    #[test]
    fn test_checkpoint_endpoints_are_stationary() {
        let options = ReplayRouteOptions::default();
        let checkpoints = assign_checkpoint_speeds(&straight_route(), &options);
        assert_eq!(checkpoints.first().unwrap().speed_mps, 0.0);
        assert_eq!(checkpoints.last().unwrap().speed_mps, 0.0);
    }

    #[test]
    fn test_lookahead_caps_speed_before_short_stop() {
        let options = ReplayRouteOptions::default();
        // 30 mps cruise 10m before a dead stop is physically impossible at
        // -4 mps^2; the pass must cap the cruise target.
        let mut checkpoints = vec![
            SpeedCheckpoint {
                point: RoutePoint::new(0.0, 0.0),
                cumulative_distance: 0.0,
                speed_mps: 30.0,
            },
            SpeedCheckpoint {
                point: RoutePoint::new(0.0, 0.0001),
                cumulative_distance: 10.0,
                speed_mps: 0.0,
            },
        ];
        apply_braking_lookahead(&mut checkpoints, &options);
        let capped = checkpoints[0].speed_mps;
        assert!(capped < 30.0);
        // sqrt(2 * 4 * 10) ≈ 8.944
        assert!((capped - 80.0_f64.sqrt()).abs() < 1e-9, "got {}", capped);
    }

    #[test]
    fn test_lookahead_braking_consistency() {
        let options = ReplayRouteOptions::default();
        let mut checkpoints = vec![
            SpeedCheckpoint {
                point: RoutePoint::new(0.0, 0.0),
                cumulative_distance: 0.0,
                speed_mps: 30.0,
            },
            SpeedCheckpoint {
                point: RoutePoint::new(0.0, 0.001),
                cumulative_distance: 111.0,
                speed_mps: 30.0,
            },
            SpeedCheckpoint {
                point: RoutePoint::new(0.0, 0.0011),
                cumulative_distance: 122.0,
                speed_mps: 1.0,
            },
            SpeedCheckpoint {
                point: RoutePoint::new(0.0, 0.0012),
                cumulative_distance: 133.0,
                speed_mps: 0.0,
            },
        ];
        apply_braking_lookahead(&mut checkpoints, &options);

        // Every adjacent slow-down now fits its run-way under min acceleration.
        for pair in checkpoints.windows(2) {
            if pair[0].speed_mps > pair[1].speed_mps {
                let run_way = pair[1].cumulative_distance - pair[0].cumulative_distance;
                let needed = braking_distance(
                    pair[0].speed_mps,
                    pair[1].speed_mps,
                    options.min_acceleration_mps2,
                );
                assert!(
                    needed <= run_way + 1e-9,
                    "needed {} > run_way {}",
                    needed,
                    run_way
                );
            }
        }
    }
}
