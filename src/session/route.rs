use std::sync::Mutex;

use tracing::info;

use crate::error::ReplayError;
use crate::event::{ReplayEvent, ReplayLocation};
use crate::playback::HistoryPlayer;
use crate::route::{ReplayRouteOptions, RouteGeometry};
use crate::source::RouteEventSource;

/// Options for a route-driving replay session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSessionOptions {
    pub route_options: ReplayRouteOptions,
    /// Replay the last known location when the route is cleared, so the
    /// consumer's position does not go stale between routes.
    pub location_reset_enabled: bool,
}

impl Default for RouteSessionOptions {
    fn default() -> Self {
        Self {
            route_options: ReplayRouteOptions::default(),
            location_reset_enabled: true,
        }
    }
}

impl RouteSessionOptions {
    pub fn with_route_options(mut self, route_options: ReplayRouteOptions) -> Self {
        self.route_options = route_options;
        self
    }

    pub fn with_location_reset_enabled(mut self, enabled: bool) -> Self {
        self.location_reset_enabled = enabled;
        self
    }
}

/// Replay session that simulates driving whichever route is active.
///
/// Each route change clears the pending events, restarts the scheduler and
/// attaches a fresh kinematic source; the player's buffer then streams the
/// simulated trace in bounded batches, so only a limited look-ahead of the
/// route is ever held in the sequence.
pub struct RouteReplaySession {
    player: HistoryPlayer,
    options: Mutex<RouteSessionOptions>,
    seed_location: Mutex<Option<ReplayLocation>>,
}

impl Default for RouteReplaySession {
    fn default() -> Self {
        Self::new(RouteSessionOptions::default())
    }
}

impl RouteReplaySession {
    pub fn new(options: RouteSessionOptions) -> Self {
        Self {
            player: HistoryPlayer::named("route-replay"),
            options: Mutex::new(options),
            seed_location: Mutex::new(None),
        }
    }

    /// Transport controls and observer registration live on the player.
    pub fn player(&self) -> &HistoryPlayer {
        &self.player
    }

    pub fn options(&self) -> RouteSessionOptions {
        *self.options.lock().unwrap()
    }

    /// Options may change at any point; they apply from the next route.
    pub fn set_options(&self, options: RouteSessionOptions) {
        *self.options.lock().unwrap() = options;
    }

    /// Last location the caller knows about, used for location reset.
    pub fn set_seed_location(&self, location: ReplayLocation) {
        *self.seed_location.lock().unwrap() = Some(location);
    }

    /// Switch the active route: clear pending events, restart the
    /// scheduler, and stream the new simulated trace.
    pub async fn set_route(&self, geometry: &RouteGeometry) {
        let options = self.options();
        info!(points = geometry.coordinates.len(), "route changed, re-priming replay");
        self.player.clear_events().await;
        self.player.play().await;
        self.player
            .attach_source(Box::new(RouteEventSource::new(
                geometry,
                &options.route_options,
            )))
            .await;
    }

    /// Traffic-aware route switch; requires per-segment annotations.
    pub async fn set_annotated_route(&self, geometry: &RouteGeometry) -> Result<(), ReplayError> {
        let options = self.options();
        let source = RouteEventSource::annotated(geometry, &options.route_options)?;
        info!(points = geometry.coordinates.len(), "annotated route changed, re-priming replay");
        self.player.clear_events().await;
        self.player.play().await;
        self.player.attach_source(Box::new(source)).await;
        Ok(())
    }

    /// The active route went away. Simulation stops; when location reset is
    /// enabled and a seed is known, that single location is replayed so
    /// consumers keep a position fix.
    pub async fn clear_route(&self) {
        self.player.clear_events().await;
        let seed = if self.options().location_reset_enabled {
            self.seed_location.lock().unwrap().clone()
        } else {
            None
        };
        if let Some(location) = seed {
            self.player.play().await;
            self.player
                .push_events(vec![ReplayEvent::location(0.0, location)])
                .await;
        }
    }

    /// Detach: stop playback and drop session state.
    pub async fn finish(&self) {
        self.player.finish().await;
    }
}
