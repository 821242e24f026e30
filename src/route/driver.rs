use tracing::debug;

use crate::error::ReplayError;
use crate::event::{ReplayEvent, ReplayLocation};
use crate::route::curves;
use crate::route::geometry::{self, RouteGeometry, RoutePoint};
use crate::route::interpolator::{self, STEP_SECONDS};
use crate::route::options::ReplayRouteOptions;
use crate::route::profile::{self, ReplayRouteLocation, SpeedCheckpoint};
use crate::route::smoother;

/// Provider tag stamped on simulated location events.
pub const REPLAY_ROUTE_PROVIDER: &str = "replay-route";

/// Horizontal accuracy reported for simulated locations, meters.
const SIMULATED_ACCURACY_METERS: f64 = 3.0;

/// Turns static route geometry into a physically constrained location trace.
///
/// Stateless; both entry points are pure functions of their inputs and can
/// be called from any context.
pub struct ReplayRouteDriver;

impl ReplayRouteDriver {
    /// Simulate driving along a geometry under the kinematic options.
    ///
    /// Fewer than 2 distinct coordinates produce an empty trace, not an
    /// error: there is nothing to drive.
    pub fn drive_geometry(
        geometry: &RouteGeometry,
        options: &ReplayRouteOptions,
    ) -> Vec<ReplayEvent> {
        Self::simulate_geometry(&geometry.coordinates, options)
            .iter()
            .map(location_event)
            .collect()
    }

    /// Traffic-aware variant: every annotated segment boundary becomes a
    /// forced speed checkpoint, using the backend's distances instead of
    /// haversine lengths.
    ///
    /// Annotations are a hard precondition; callers must check before
    /// requesting traffic-aware driving.
    pub fn drive_annotated(
        geometry: &RouteGeometry,
        options: &ReplayRouteOptions,
    ) -> Result<Vec<ReplayEvent>, ReplayError> {
        let coordinates = smoother::dedupe(&geometry.coordinates);
        if coordinates.len() < 2 {
            return Ok(Vec::new());
        }
        let expected = geometry.coordinates.len() - 1;
        let annotations = geometry
            .annotations
            .as_deref()
            .filter(|a| a.len() == expected)
            .ok_or(ReplayError::MissingAnnotations { expected })?;

        let mut cumulative = 0.0;
        let mut checkpoints = Vec::with_capacity(geometry.coordinates.len());
        for (i, &point) in geometry.coordinates.iter().enumerate() {
            // Boundary speed: the slower of the two adjoining segments.
            let speed_mps = if i == 0 || i == geometry.coordinates.len() - 1 {
                0.0
            } else {
                annotations[i - 1]
                    .speed_mps
                    .min(annotations[i].speed_mps)
                    .min(options.max_speed_mps)
            };
            checkpoints.push(SpeedCheckpoint {
                point,
                cumulative_distance: cumulative,
                speed_mps,
            });
            if i < annotations.len() {
                cumulative += annotations[i].distance_meters;
            }
        }
        profile::apply_braking_lookahead(&mut checkpoints, options);

        let caps: Vec<f64> = annotations
            .iter()
            .map(|a| a.speed_mps.min(options.max_speed_mps))
            .collect();
        let locations = integrate(&checkpoints, &caps, options);
        Ok(locations.iter().map(location_event).collect())
    }

    /// The full kinematic pipeline, exposed for sessions that want the raw
    /// annotated locations rather than events.
    pub fn simulate_geometry(
        coordinates: &[RoutePoint],
        options: &ReplayRouteOptions,
    ) -> Vec<ReplayRouteLocation> {
        let distinct = smoother::dedupe(coordinates);
        if distinct.len() < 2 {
            debug!(points = distinct.len(), "not enough distinct points to drive");
            return Vec::new();
        }

        let smoothed = smoother::smooth(&distinct, smoother::DEFAULT_SMOOTHING_THRESHOLD_METERS);
        let mut checkpoints = profile::assign_checkpoint_speeds(&smoothed, options);
        checkpoints = curves::insert_turn_curves(&checkpoints, options);
        profile::apply_braking_lookahead(&mut checkpoints, options);

        let caps = vec![options.max_speed_mps; checkpoints.len().saturating_sub(1)];
        integrate(&checkpoints, &caps, options)
    }
}

/// Walk checkpoint pairs through the integrator and position each emitted
/// step along the checkpoint polyline. `caps` holds one cruise ceiling per
/// segment.
fn integrate(
    checkpoints: &[SpeedCheckpoint],
    caps: &[f64],
    options: &ReplayRouteOptions,
) -> Vec<ReplayRouteLocation> {
    if checkpoints.len() < 2 {
        return Vec::new();
    }

    let points: Vec<RoutePoint> = checkpoints.iter().map(|c| c.point).collect();
    let cumulative: Vec<f64> = checkpoints.iter().map(|c| c.cumulative_distance).collect();

    let mut locations = Vec::new();
    locations.push(ReplayRouteLocation {
        route_index: 0,
        point: checkpoints[0].point,
        distance_meters: 0.0,
        speed_mps: checkpoints[0].speed_mps,
        bearing: 0.0,
        time_offset_secs: 0.0,
    });

    let mut time_offset = 0.0;
    for i in 0..checkpoints.len() - 1 {
        let segment = checkpoints[i + 1].cumulative_distance - checkpoints[i].cumulative_distance;
        let steps = interpolator::interpolate_speed_for_distance(
            checkpoints[i].speed_mps,
            checkpoints[i + 1].speed_mps,
            segment,
            caps[i],
            options,
        );
        for step in steps {
            time_offset += STEP_SECONDS;
            let distance = checkpoints[i].cumulative_distance + step.position_meters;
            locations.push(ReplayRouteLocation {
                route_index: i + 1,
                point: geometry::point_at_distance(&points, &cumulative, distance),
                distance_meters: distance,
                speed_mps: step.speed_mps,
                bearing: 0.0,
                time_offset_secs: time_offset,
            });
        }
    }

    interpolator::apply_bearings(&mut locations);
    locations
}

/// Map one simulated location to the event the player replays.
fn location_event(location: &ReplayRouteLocation) -> ReplayEvent {
    ReplayEvent::UpdateLocation {
        event_timestamp: location.time_offset_secs,
        location: ReplayLocation {
            provider: Some(REPLAY_ROUTE_PROVIDER.to_string()),
            time: Some(location.time_offset_secs),
            accuracy_horizontal: Some(SIMULATED_ACCURACY_METERS),
            bearing: Some(location.bearing),
            speed: Some(location.speed_mps),
            ..ReplayLocation::new(location.point.lon, location.point.lat)
        },
    }
}
