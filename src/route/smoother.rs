use crate::route::geometry::{self, RoutePoint};

/// Vertices closer than this to the chord between their neighbors are
/// treated as polyline noise and collapsed.
pub const DEFAULT_SMOOTHING_THRESHOLD_METERS: f64 = 3.0;

/// Remove consecutive duplicate coordinates.
pub fn dedupe(points: &[RoutePoint]) -> Vec<RoutePoint> {
    let mut result: Vec<RoutePoint> = Vec::with_capacity(points.len());
    for &point in points {
        if result.last() != Some(&point) {
            result.push(point);
        }
    }
    result
}

/// Collapse near-collinear vertices.
///
/// A vertex is dropped when its perpendicular distance to the chord between
/// the previously kept vertex and its successor is below `threshold_meters`.
/// Without this pass, GPS and polyline quantization noise reads as a series
/// of tiny turns and the speed profile never reaches cruise speed.
pub fn smooth(points: &[RoutePoint], threshold_meters: f64) -> Vec<RoutePoint> {
    let points = dedupe(points);
    if points.len() <= 2 {
        return points;
    }

    let mut result = Vec::with_capacity(points.len());
    result.push(points[0]);
    for i in 1..points.len() - 1 {
        let anchor = *result.last().unwrap();
        let offset = geometry::distance_to_chord(points[i], anchor, points[i + 1]);
        if offset >= threshold_meters {
            result.push(points[i]);
        }
    }
    result.push(*points.last().unwrap());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_removes_repeats() {
        let points = vec![
            RoutePoint::new(0.0, 0.0),
            RoutePoint::new(0.0, 0.0),
            RoutePoint::new(0.0, 0.01),
            RoutePoint::new(0.0, 0.01),
        ];
        assert_eq!(dedupe(&points).len(), 2);
    }

    #[test]
    fn test_smooth_collapses_collinear_midpoint() {
        // Straight 3-point run north: the midpoint sits on the chord.
        let points = vec![
            RoutePoint::new(0.0, 0.0),
            RoutePoint::new(0.0, 0.01),
            RoutePoint::new(0.0, 0.02),
        ];
        let smoothed = smooth(&points, DEFAULT_SMOOTHING_THRESHOLD_METERS);
        assert_eq!(smoothed.len(), 2);
        assert_eq!(smoothed[0], points[0]);
        assert_eq!(smoothed[1], points[2]);
    }

    #[test]
    fn test_smooth_keeps_real_corner() {
        // Right-angle corner, each leg ~1.1km.
        let points = vec![
            RoutePoint::new(0.0, 0.0),
            RoutePoint::new(0.0, 0.01),
            RoutePoint::new(0.01, 0.01),
        ];
        let smoothed = smooth(&points, DEFAULT_SMOOTHING_THRESHOLD_METERS);
        assert_eq!(smoothed.len(), 3);
    }

    #[test]
    fn test_smooth_short_input_unchanged() {
        let points = vec![RoutePoint::new(0.0, 0.0), RoutePoint::new(0.0, 0.01)];
        assert_eq!(smooth(&points, 3.0), points);
    }
}
