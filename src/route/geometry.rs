use serde::{Deserialize, Serialize};

/// Mean earth radius in meters, matching the value turf-style libraries use.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A coordinate on a route, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lon: f64,
    pub lat: f64,
}

impl RoutePoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Per-segment annotation from a routing backend: how long the segment is
/// and how fast traffic moves over it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentAnnotation {
    pub distance_meters: f64,
    pub speed_mps: f64,
}

/// An ordered path of coordinates, optionally annotated per segment.
///
/// `annotations`, when present, must have exactly one entry per segment,
/// i.e. `coordinates.len() - 1` entries. The traffic-aware driver checks
/// this before doing any work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteGeometry {
    pub coordinates: Vec<RoutePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<SegmentAnnotation>>,
}

impl RouteGeometry {
    pub fn new(coordinates: Vec<RoutePoint>) -> Self {
        Self {
            coordinates,
            annotations: None,
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<SegmentAnnotation>) -> Self {
        self.annotations = Some(annotations);
        self
    }

    /// Sum of the haversine segment lengths.
    pub fn length_meters(&self) -> f64 {
        self.coordinates
            .windows(2)
            .map(|pair| distance(pair[0], pair[1]))
            .sum()
    }
}

/// Haversine distance between two coordinates, meters.
pub fn distance(from: RoutePoint, to: RoutePoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = (to.lat - from.lat).to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * a.sqrt().asin() * EARTH_RADIUS_METERS
}

/// Initial great-circle bearing from one coordinate toward another, in
/// degrees clockwise from north, normalized to [0, 360).
pub fn bearing(from: RoutePoint, to: RoutePoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Absolute difference between two bearings, folded into [0, 180].
pub fn bearing_delta(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs() % 360.0;
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Point a fraction of the way along a single segment.
///
/// Linear in lon/lat, which is accurate to well under a meter for the
/// road-scale segments the engine walks.
pub fn point_along(from: RoutePoint, to: RoutePoint, fraction: f64) -> RoutePoint {
    let f = fraction.clamp(0.0, 1.0);
    RoutePoint::new(
        from.lon + (to.lon - from.lon) * f,
        from.lat + (to.lat - from.lat) * f,
    )
}

/// Cumulative distance from the first point to every point of a polyline.
/// The result has the same length as `points`; index 0 is 0.0.
pub fn cumulative_distances(points: &[RoutePoint]) -> Vec<f64> {
    if points.is_empty() {
        return Vec::new();
    }
    let mut result = Vec::with_capacity(points.len());
    let mut total = 0.0;
    result.push(0.0);
    for pair in points.windows(2) {
        total += distance(pair[0], pair[1]);
        result.push(total);
    }
    result
}

/// Point at `target` meters along a polyline, given its cumulative
/// distances. Clamps to the endpoints.
pub fn point_at_distance(points: &[RoutePoint], cumulative: &[f64], target: f64) -> RoutePoint {
    debug_assert_eq!(points.len(), cumulative.len());
    if target <= 0.0 || points.len() < 2 {
        return points[0];
    }
    let total = *cumulative.last().unwrap_or(&0.0);
    if target >= total {
        return *points.last().unwrap();
    }

    let upper = cumulative.partition_point(|&d| d < target);
    let lower = upper - 1;
    let segment_length = cumulative[upper] - cumulative[lower];
    if segment_length <= 0.0 {
        return points[lower];
    }
    let fraction = (target - cumulative[lower]) / segment_length;
    point_along(points[lower], points[upper], fraction)
}

/// Lat/lon projected onto the unit sphere.
fn to_unit_sphere(point: RoutePoint) -> [f64; 3] {
    let lat = point.lat.to_radians();
    let lon = point.lon.to_radians();
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

/// Perpendicular distance in meters from `point` to the straight chord
/// between `start` and `end`, computed in 3D cartesian space so that
/// near-collinear GPS noise is measured consistently regardless of latitude.
pub fn distance_to_chord(point: RoutePoint, start: RoutePoint, end: RoutePoint) -> f64 {
    let p = to_unit_sphere(point);
    let a = to_unit_sphere(start);
    let b = to_unit_sphere(end);

    let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let ap = [p[0] - a[0], p[1] - a[1], p[2] - a[2]];

    let ab_len_sq = ab[0] * ab[0] + ab[1] * ab[1] + ab[2] * ab[2];
    if ab_len_sq == 0.0 {
        let ap_len = (ap[0] * ap[0] + ap[1] * ap[1] + ap[2] * ap[2]).sqrt();
        return ap_len * EARTH_RADIUS_METERS;
    }

    // Project onto the chord, clamped to the segment.
    let t = ((ap[0] * ab[0] + ap[1] * ab[1] + ap[2] * ab[2]) / ab_len_sq).clamp(0.0, 1.0);
    let closest = [a[0] + ab[0] * t, a[1] + ab[1] * t, a[2] + ab[2] * t];
    let d = [p[0] - closest[0], p[1] - closest[1], p[2] - closest[2]];
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt() * EARTH_RADIUS_METERS
}
