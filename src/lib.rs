//! Location trace replay and route-driving simulation.
//!
//! `tracesim` lets a navigation client replay recorded or synthetically
//! generated location traces as if they were live positioning updates, for
//! testing, demos and QA without physical movement.
//!
//! The crate splits into:
//! - [`event`]: the timestamped event model and ordered sequences
//! - [`source`]: lazy event sources (in-memory, history files, CSV traces,
//!   generated kinematic traces)
//! - [`route`]: the pure kinematics engine turning geometry into motion
//! - [`playback`]: the simulated clock, the refillable buffer, and the
//!   [`playback::HistoryPlayer`] facade with its cooperative playback task
//! - [`session`]: ready-made sessions for route driving and history files
//!
//! ```no_run
//! use std::sync::Arc;
//! use tracesim::playback::{HistoryPlayer, ReplayEventsObserver};
//! use tracesim::route::{ReplayRouteOptions, RouteGeometry, RoutePoint};
//! use tracesim::source::RouteEventSource;
//!
//! # async fn demo(observer: Arc<dyn ReplayEventsObserver>) {
//! let route = RouteGeometry::new(vec![
//!     RoutePoint::new(8.8512315, 49.2492411),
//!     RoutePoint::new(8.8530, 49.2510),
//! ]);
//! let player = HistoryPlayer::new();
//! player.register_observer(observer);
//! player
//!     .attach_source(Box::new(RouteEventSource::new(
//!         &route,
//!         &ReplayRouteOptions::default(),
//!     )))
//!     .await;
//! player.play().await;
//! # }
//! ```

pub mod error;
pub mod event;
pub mod playback;
pub mod route;
pub mod session;
pub mod source;

pub use error::ReplayError;
pub use event::{EventSequence, ReplayEvent, ReplayLocation};
pub use playback::{EventBuffer, HistoryPlayer, ReplayClock, ReplayEventsObserver};
pub use route::{ReplayRouteDriver, ReplayRouteOptions, RouteGeometry, RoutePoint};
pub use session::{HistoryReplaySession, RouteReplaySession, RouteSessionOptions};
pub use source::{CsvTraceSource, EventSource, HistoryFileSource, MemoryEventSource, RouteEventSource};
