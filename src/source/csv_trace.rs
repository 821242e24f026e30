use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use tracing::warn;

use crate::error::ReplayError;
use crate::event::{ReplayEvent, ReplayLocation};
use crate::source::EventSource;

/// Location trace loaded from a CSV file.
///
/// Supports flexible column layouts:
/// - time,lat,lon
/// - timestamp,latitude,longitude,speed,bearing
/// - t,lat,lon,altitude
///
/// The time column accepts either seconds (relative or epoch) or an RFC 3339
/// timestamp. Rows that fail to parse are skipped with a diagnostic.
pub struct CsvTraceSource {
    events: Vec<ReplayEvent>,
    cursor: usize,
    closed: bool,
}

impl CsvTraceSource {
    /// Load and parse the whole file up front; CSV traces are small compared
    /// to history logs, so there is nothing to stream.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path.as_ref())
            .with_context(|| format!("failed to open {}", path.as_ref().display()))?;

        let headers = rdr.headers()?;
        let time_idx = find_column(headers, &["time", "timestamp", "t", "ts"])?;
        let lat_idx = find_column(headers, &["lat", "latitude"])?;
        let lon_idx = find_column(headers, &["lon", "lng", "longitude"])?;
        let speed_idx = find_column(headers, &["speed", "speed_mps"]).ok();
        let bearing_idx = find_column(headers, &["bearing", "heading", "course"]).ok();
        let altitude_idx = find_column(headers, &["altitude", "alt", "elevation"]).ok();

        let mut events = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.context("failed to read CSV row")?;

            let timestamp = record.get(time_idx).and_then(parse_time);
            let lat = record.get(lat_idx).and_then(|s| s.parse::<f64>().ok());
            let lon = record.get(lon_idx).and_then(|s| s.parse::<f64>().ok());
            let (Some(timestamp), Some(lat), Some(lon)) = (timestamp, lat, lon) else {
                warn!(row, "skipping CSV row with unparseable time or coordinates");
                continue;
            };

            let field = |idx: Option<usize>| {
                idx.and_then(|i| record.get(i))
                    .and_then(|s| s.parse::<f64>().ok())
            };
            events.push(ReplayEvent::UpdateLocation {
                event_timestamp: timestamp,
                location: ReplayLocation {
                    provider: Some("csv".to_string()),
                    time: Some(timestamp),
                    altitude: field(altitude_idx),
                    speed: field(speed_idx),
                    bearing: field(bearing_idx),
                    ..ReplayLocation::new(lon, lat)
                },
            });
        }

        Ok(Self {
            events,
            cursor: 0,
            closed: false,
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Seconds (plain float) or RFC 3339.
fn parse_time(value: &str) -> Option<f64> {
    if let Ok(seconds) = value.parse::<f64>() {
        return Some(seconds);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis() as f64 / 1000.0)
}

/// Find a column by checking possible names, case-insensitively.
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize> {
    for (idx, header) in headers.iter().enumerate() {
        let header_lower = header.to_lowercase();
        if names.iter().any(|&name| header_lower == name) {
            return Ok(idx);
        }
    }
    anyhow::bail!("could not find column with names: {:?}", names)
}

#[async_trait]
impl EventSource for CsvTraceSource {
    async fn has_next(&mut self) -> bool {
        !self.closed && self.cursor < self.events.len()
    }

    async fn next_event(&mut self) -> Option<ReplayEvent> {
        if self.closed {
            return None;
        }
        let event = self.events.get(self.cursor).cloned();
        if event.is_some() {
            self.cursor += 1;
        }
        event
    }

    async fn restart(&mut self) -> Result<(), ReplayError> {
        self.cursor = 0;
        self.closed = false;
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
