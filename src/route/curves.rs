use crate::route::geometry::{self, RoutePoint, EARTH_RADIUS_METERS};
use crate::route::options::ReplayRouteOptions;
use crate::route::profile::SpeedCheckpoint;

/// Bearing change at a vertex above which the vertex is replaced by an arc.
pub const CURVE_BEARING_THRESHOLD_DEGREES: f64 = 40.0;
/// Upper bound on the path length of an inserted arc.
pub const CURVE_MAX_LENGTH_METERS: f64 = 5.0;

/// Replace sharp vertices with short interpolated arcs.
///
/// A simulated vehicle must not change heading instantaneously. Wherever the
/// bearing delta at an interior vertex exceeds the threshold, the vertex is
/// swapped for a 5-7 sub-point arc whose chords rotate evenly from the
/// inbound to the outbound heading. The arc consumes an equal trim from both
/// incident segments, capped so the whole arc stays within
/// [`CURVE_MAX_LENGTH_METERS`]. Arc points inherit the vertex's profiled
/// speed; cumulative distances are rebuilt over the new point list.
pub fn insert_turn_curves(
    checkpoints: &[SpeedCheckpoint],
    options: &ReplayRouteOptions,
) -> Vec<SpeedCheckpoint> {
    if checkpoints.len() < 3 {
        return checkpoints.to_vec();
    }

    let mut flat: Vec<(RoutePoint, f64)> = Vec::with_capacity(checkpoints.len());
    flat.push((checkpoints[0].point, checkpoints[0].speed_mps));

    for i in 1..checkpoints.len() - 1 {
        let prev = checkpoints[i - 1].point;
        let vertex = checkpoints[i].point;
        let next = checkpoints[i + 1].point;
        let speed = checkpoints[i].speed_mps;

        let inbound = geometry::bearing(prev, vertex);
        let outbound = geometry::bearing(vertex, next);
        let delta = geometry::bearing_delta(inbound, outbound);
        if delta <= CURVE_BEARING_THRESHOLD_DEGREES {
            flat.push((vertex, speed));
            continue;
        }

        let len_in = geometry::distance(prev, vertex);
        let len_out = geometry::distance(vertex, next);
        let trim = (CURVE_MAX_LENGTH_METERS / 2.0)
            .min(len_in / 2.0)
            .min(len_out / 2.0);
        if trim <= 0.0 {
            flat.push((vertex, speed));
            continue;
        }

        let entry = geometry::point_along(prev, vertex, (len_in - trim) / len_in);
        let exit = geometry::point_along(vertex, next, trim / len_out);
        for point in build_arc(entry, exit, vertex, inbound, outbound, speed, options) {
            flat.push((point, speed));
        }
    }

    let last = checkpoints.last().unwrap();
    flat.push((last.point, last.speed_mps));

    let points: Vec<RoutePoint> = flat.iter().map(|(p, _)| *p).collect();
    let cumulative = geometry::cumulative_distances(&points);
    flat.into_iter()
        .zip(cumulative)
        .map(|((point, speed_mps), cumulative_distance)| SpeedCheckpoint {
            point,
            cumulative_distance,
            speed_mps,
        })
        .collect()
}

/// Number of arc points for a turn taken at `speed_mps`. Slow, sharp turns
/// get the densest arc so each chord still rotates below the threshold.
fn arc_point_count(speed_mps: f64, options: &ReplayRouteOptions) -> usize {
    let ratio = (speed_mps / options.max_speed_mps).clamp(0.0, 1.0);
    7 - (ratio * 2.0).round() as usize
}

/// Build an arc from `entry` to `exit`, rotating evenly from the inbound to
/// the outbound heading. Works in a local planar frame around the vertex;
/// the small residual from the planar walk is distributed back over the
/// points so the arc lands exactly on `exit`.
fn build_arc(
    entry: RoutePoint,
    exit: RoutePoint,
    vertex: RoutePoint,
    inbound_bearing: f64,
    outbound_bearing: f64,
    speed_mps: f64,
    options: &ReplayRouteOptions,
) -> Vec<RoutePoint> {
    let count = arc_point_count(speed_mps, options);
    let segments = (count - 1) as f64;

    // Signed total rotation, inbound -> outbound, shortest way around.
    let mut turn = (outbound_bearing - inbound_bearing) % 360.0;
    if turn > 180.0 {
        turn -= 360.0;
    } else if turn < -180.0 {
        turn += 360.0;
    }

    let meters_per_deg_lat = EARTH_RADIUS_METERS.to_radians();
    let meters_per_deg_lon = meters_per_deg_lat * vertex.lat.to_radians().cos();
    let to_local = |p: RoutePoint| -> (f64, f64) {
        (
            (p.lon - vertex.lon) * meters_per_deg_lon,
            (p.lat - vertex.lat) * meters_per_deg_lat,
        )
    };
    let to_geo = |x: f64, y: f64| -> RoutePoint {
        RoutePoint::new(vertex.lon + x / meters_per_deg_lon, vertex.lat + y / meters_per_deg_lat)
    };

    let (entry_x, entry_y) = to_local(entry);
    let (exit_x, exit_y) = to_local(exit);

    // Circular fillet tangent to both segments at the trim points: radius
    // r = trim / tan(turn/2), path length r * turn. Collapses toward zero
    // for a true u-turn, where entry and exit nearly coincide.
    let trim = (geometry::distance(entry, vertex) + geometry::distance(vertex, exit)) / 2.0;
    let turn_rad = turn.abs().to_radians();
    let half_tan = (turn_rad / 2.0).tan();
    let arc_length = if half_tan > 1e-9 {
        (trim / half_tan) * turn_rad
    } else {
        trim * 2.0
    };
    let step = arc_length / segments;

    // Walk chords whose headings rotate evenly across the turn.
    let mut local = vec![(entry_x, entry_y)];
    let (mut x, mut y) = (entry_x, entry_y);
    for k in 0..count - 1 {
        let heading = inbound_bearing + turn * (k as f64 + 0.5) / segments;
        let rad = heading.to_radians();
        x += step * rad.sin();
        y += step * rad.cos();
        local.push((x, y));
    }

    // Close the residual gap proportionally so the last point is `exit`.
    let (end_x, end_y) = *local.last().unwrap();
    let (err_x, err_y) = (exit_x - end_x, exit_y - end_y);
    local
        .into_iter()
        .enumerate()
        .map(|(j, (px, py))| {
            let f = j as f64 / segments;
            to_geo(px + err_x * f, py + err_y * f)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::profile::assign_checkpoint_speeds;

    fn hairpin_route() -> Vec<RoutePoint> {
        // North for ~1.1km, then a 170 degree turn.
        let b = RoutePoint::new(0.0, 0.01);
        let h = 0.005;
        let c = RoutePoint::new(
            b.lon + h * 170.0_f64.to_radians().sin(),
            b.lat + h * 170.0_f64.to_radians().cos(),
        );
        vec![RoutePoint::new(0.0, 0.0), b, c]
    }

    #[test]
    fn test_gentle_route_unchanged() {
        let options = ReplayRouteOptions::default();
        let points = vec![
            RoutePoint::new(0.0, 0.0),
            RoutePoint::new(0.0, 0.01),
            RoutePoint::new(0.003, 0.02),
        ];
        let checkpoints = assign_checkpoint_speeds(&points, &options);
        let curved = insert_turn_curves(&checkpoints, &options);
        assert_eq!(curved.len(), checkpoints.len());
    }

    #[test]
    fn test_hairpin_vertex_replaced_by_arc() {
        let options = ReplayRouteOptions::default();
        let checkpoints = assign_checkpoint_speeds(&hairpin_route(), &options);
        // Vertex speed at a 170 degree turn is the u-turn speed.
        assert_eq!(checkpoints[1].speed_mps, options.u_turn_speed_mps);

        let curved = insert_turn_curves(&checkpoints, &options);
        // Endpoints plus at least 5 arc sub-points.
        assert!(curved.len() >= 2 + 5, "got {} points", curved.len());

        // Every chord-to-chord rotation stays below the curve threshold.
        let points: Vec<RoutePoint> = curved.iter().map(|c| c.point).collect();
        let bearings: Vec<f64> = points
            .windows(2)
            .map(|pair| geometry::bearing(pair[0], pair[1]))
            .collect();
        for pair in bearings.windows(2) {
            let delta = geometry::bearing_delta(pair[0], pair[1]);
            assert!(
                delta < CURVE_BEARING_THRESHOLD_DEGREES,
                "chord rotation {} exceeds threshold",
                delta
            );
        }
    }

    #[test]
    fn test_arc_stays_short() {
        let options = ReplayRouteOptions::default();
        let checkpoints = assign_checkpoint_speeds(&hairpin_route(), &options);
        let curved = insert_turn_curves(&checkpoints, &options);

        // The arc replaces only a few meters around the vertex.
        let arc: Vec<&SpeedCheckpoint> = curved
            .iter()
            .filter(|c| c.speed_mps == options.u_turn_speed_mps)
            .collect();
        let arc_length = arc.last().unwrap().cumulative_distance
            - arc.first().unwrap().cumulative_distance;
        assert!(
            arc_length <= CURVE_MAX_LENGTH_METERS + 0.5,
            "arc length {}",
            arc_length
        );
    }

    #[test]
    fn test_arc_points_are_monotonic_along_route() {
        let options = ReplayRouteOptions::default();
        let checkpoints = assign_checkpoint_speeds(&hairpin_route(), &options);
        let curved = insert_turn_curves(&checkpoints, &options);
        for pair in curved.windows(2) {
            assert!(pair[1].cumulative_distance > pair[0].cumulative_distance);
        }
    }
}
