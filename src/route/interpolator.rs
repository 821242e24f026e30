use crate::route::geometry;
use crate::route::options::ReplayRouteOptions;
use crate::route::profile::ReplayRouteLocation;

/// Simulated seconds per integrator step.
pub const STEP_SECONDS: f64 = 1.0;

/// Defends against degenerate option sets (zero acceleration limits).
const MAX_INTEGRATOR_STEPS: usize = 100_000;

/// One integrator step within a single checkpoint-to-checkpoint segment.
#[derive(Debug, Clone, Copy)]
pub struct SpeedStep {
    pub speed_mps: f64,
    /// Meters traveled from the segment start.
    pub position_meters: f64,
}

/// Numerically integrate speed over one segment.
///
/// Steps at [`STEP_SECONDS`]: pick the highest next speed that the remaining
/// distance can still brake down from (so the braking invariant holds at
/// every emitted step), clamped by the acceleration limits and the segment's
/// cruise ceiling, then advance position by the trapezoid of the two speeds.
/// The final step always lands exactly on the segment end at the target
/// speed. `cruise_speed_mps` is the route-wide limit for plain geometry
/// driving and the annotated traffic speed for the traffic-aware variant.
///
/// Returns the steps strictly after the segment start; the caller already
/// holds a location for the start itself.
pub fn interpolate_speed_for_distance(
    from_speed_mps: f64,
    to_speed_mps: f64,
    distance_meters: f64,
    cruise_speed_mps: f64,
    options: &ReplayRouteOptions,
) -> Vec<SpeedStep> {
    let mut steps = Vec::new();
    if distance_meters <= f64::EPSILON {
        return steps;
    }

    let braking = -options.min_acceleration_mps2;
    let mut speed = from_speed_mps;
    let mut position = 0.0;

    for _ in 0..MAX_INTEGRATOR_STEPS {
        let remaining = distance_meters - position;

        // Highest speed for the next step that still leaves the remaining
        // run-way at or above the braking distance to the target:
        //   remaining - (v + u)/2 >= (u^2 - to^2) / (2g)
        // solved for u.
        let discriminant = braking * braking
            + 4.0 * (2.0 * braking * remaining + to_speed_mps * to_speed_mps - braking * speed);
        let unconstrained = if discriminant > 0.0 {
            (-braking + discriminant.sqrt()) / 2.0
        } else {
            0.0
        };

        let next_speed = unconstrained
            .min(speed + options.max_acceleration_mps2 * STEP_SECONDS)
            .min(cruise_speed_mps)
            .max(speed + options.min_acceleration_mps2 * STEP_SECONDS)
            .max(0.0);

        let advance = (speed + next_speed) * 0.5 * STEP_SECONDS;
        if position + advance >= distance_meters - 1e-3 || advance <= f64::EPSILON {
            break;
        }

        position += advance;
        speed = next_speed;
        steps.push(SpeedStep {
            speed_mps: speed,
            position_meters: position,
        });
    }

    steps.push(SpeedStep {
        speed_mps: to_speed_mps,
        position_meters: distance_meters,
    });
    steps
}

/// Back-fill bearings over the emitted locations.
///
/// Each location looks two steps ahead so that per-second jitter does not
/// read as heading changes; the tail falls back to the terminal bearing.
pub fn apply_bearings(locations: &mut [ReplayRouteLocation]) {
    let n = locations.len();
    if n < 2 {
        return;
    }

    for i in 0..n {
        let target = if i + 2 < n {
            locations[i + 2].point
        } else {
            locations[n - 1].point
        };
        if target != locations[i].point {
            locations[i].bearing = geometry::bearing(locations[i].point, target);
        } else if i > 0 {
            locations[i].bearing = locations[i - 1].bearing;
        }
    }
}
