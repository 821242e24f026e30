use serde::{Deserialize, Serialize};

use crate::route::RouteGeometry;

/// A single timestamped occurrence in a replay sequence.
///
/// Every variant carries `event_timestamp` in seconds. Within one sealed
/// sequence timestamps are expected to be non-decreasing; the scheduler
/// measures all progress relative to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReplayEvent {
    /// A location sample, the payload navigation consumers care about.
    #[serde(rename_all = "camelCase")]
    UpdateLocation {
        event_timestamp: f64,
        location: ReplayLocation,
    },

    /// The active route changed. `None` clears the route.
    #[serde(rename_all = "camelCase")]
    SetRoute {
        event_timestamp: f64,
        route: Option<RouteGeometry>,
    },

    /// A status poll recorded in the trace. Carries no payload.
    #[serde(rename_all = "camelCase")]
    GetStatus { event_timestamp: f64 },
}

impl ReplayEvent {
    /// Timestamp of the event in seconds.
    pub fn event_timestamp(&self) -> f64 {
        match self {
            ReplayEvent::UpdateLocation {
                event_timestamp, ..
            } => *event_timestamp,
            ReplayEvent::SetRoute {
                event_timestamp, ..
            } => *event_timestamp,
            ReplayEvent::GetStatus { event_timestamp } => *event_timestamp,
        }
    }

    /// True for location samples.
    pub fn is_location(&self) -> bool {
        matches!(self, ReplayEvent::UpdateLocation { .. })
    }

    /// Convenience constructor for a bare location sample.
    pub fn location(event_timestamp: f64, location: ReplayLocation) -> Self {
        ReplayEvent::UpdateLocation {
            event_timestamp,
            location,
        }
    }

    /// Convenience constructor for a status poll.
    pub fn status(event_timestamp: f64) -> Self {
        ReplayEvent::GetStatus { event_timestamp }
    }
}

/// A replayed location sample.
///
/// Only `lon`/`lat` are mandatory; recorded traces often omit the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayLocation {
    pub lon: f64,
    pub lat: f64,

    /// Name of the provider that produced the original sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Device time of the original sample, epoch seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_horizontal: Option<f64>,

    /// Heading in degrees clockwise from north.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,

    /// Ground speed in meters per second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl ReplayLocation {
    /// Create a location with only the mandatory coordinates set.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            provider: None,
            time: None,
            altitude: None,
            accuracy_horizontal: None,
            bearing: None,
            speed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_round_trip() {
        let event = ReplayEvent::UpdateLocation {
            event_timestamp: 1580777612.89,
            location: ReplayLocation {
                provider: Some("fused".to_string()),
                time: Some(1580777612.892),
                altitude: Some(212.47),
                accuracy_horizontal: Some(4.29),
                bearing: Some(243.31),
                speed: Some(0.56),
                ..ReplayLocation::new(8.8512315, 49.2492411)
            },
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"updateLocation\""));
        let back: ReplayEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let event = ReplayEvent::location(1.0, ReplayLocation::new(8.0, 49.0));
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("provider"));
        assert!(!json.contains("bearing"));
    }

    #[test]
    fn test_status_timestamp() {
        assert_eq!(ReplayEvent::status(42.5).event_timestamp(), 42.5);
    }
}
