use async_trait::async_trait;

use crate::error::ReplayError;
use crate::event::ReplayEvent;
use crate::route::{ReplayRouteDriver, ReplayRouteOptions, RouteGeometry};
use crate::source::{EventSource, MemoryEventSource};

/// Kinematic trace served as an event source.
///
/// The speed profile needs whole-route passes, so the trace is generated up
/// front (pure computation), but events are handed out lazily through the
/// source contract so the buffer streams simulation output exactly like
/// file output.
pub struct RouteEventSource {
    inner: MemoryEventSource,
}

impl RouteEventSource {
    /// Simulate driving `geometry` under `options`.
    pub fn new(geometry: &RouteGeometry, options: &ReplayRouteOptions) -> Self {
        Self {
            inner: MemoryEventSource::new(ReplayRouteDriver::drive_geometry(geometry, options)),
        }
    }

    /// Traffic-aware variant; requires per-segment annotations.
    pub fn annotated(
        geometry: &RouteGeometry,
        options: &ReplayRouteOptions,
    ) -> Result<Self, ReplayError> {
        Ok(Self {
            inner: MemoryEventSource::new(ReplayRouteDriver::drive_annotated(geometry, options)?),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.remaining()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventSource for RouteEventSource {
    async fn has_next(&mut self) -> bool {
        self.inner.has_next().await
    }

    async fn next_event(&mut self) -> Option<ReplayEvent> {
        self.inner.next_event().await
    }

    async fn restart(&mut self) -> Result<(), ReplayError> {
        self.inner.restart().await
    }

    fn close(&mut self) {
        self.inner.close();
    }
}
