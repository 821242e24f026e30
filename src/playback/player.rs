use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::error::ReplayError;
use crate::event::{EventSequence, ReplayEvent};
use crate::playback::buffer::EventBuffer;
use crate::playback::clock::ReplayClock;
use crate::source::EventSource;

/// How often the playback task samples the simulated clock.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);
/// Poll interval while no events remain to play.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Receives each batch of replayed events, in chronological order.
///
/// Callbacks run on the playback task between ticks and are expected to
/// return quickly; long work belongs on the observer's own executor.
pub trait ReplayEventsObserver: Send + Sync {
    fn replay_events(&self, events: &[ReplayEvent]);
}

/// The public facade of a replay session.
///
/// Owns the pushed event sequence, the simulated clock, the refillable
/// buffer, and the cooperative playback task, and exposes the transport
/// controls. One player drives one session at a time; a fresh session needs
/// either `clear_events` or a new player.
pub struct HistoryPlayer {
    inner: Arc<PlayerInner>,
    tick_interval: Duration,
    idle_interval: Duration,
}

struct PlayerInner {
    /// Distinguishes concurrent sessions in logs; there is no global
    /// registry of players.
    session: String,
    state: tokio::sync::Mutex<PlayerState>,
    observers: std::sync::Mutex<Vec<Arc<dyn ReplayEventsObserver>>>,
    running: AtomicBool,
}

struct PlayerState {
    events: EventSequence,
    clock: ReplayClock,
    buffer: EventBuffer,
    task: Option<JoinHandle<()>>,
}

impl Default for HistoryPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryPlayer {
    pub fn new() -> Self {
        Self::named("replay")
    }

    /// A named player; the session identifier shows up in every log line.
    pub fn named(session: impl Into<String>) -> Self {
        Self::with_intervals(session, DEFAULT_TICK_INTERVAL, DEFAULT_IDLE_INTERVAL)
    }

    pub fn with_intervals(
        session: impl Into<String>,
        tick_interval: Duration,
        idle_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(PlayerInner {
                session: session.into(),
                state: tokio::sync::Mutex::new(PlayerState {
                    events: EventSequence::new(),
                    clock: ReplayClock::new(Instant::now()),
                    buffer: EventBuffer::new(),
                    task: None,
                }),
                observers: std::sync::Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
            }),
            tick_interval,
            idle_interval,
        }
    }

    pub fn session(&self) -> &str {
        &self.inner.session
    }

    /// Append events to the pending sequence. Timestamps are taken as
    /// given and never reordered; a batch behind the current simulated time
    /// plays on the next tick.
    pub async fn push_events(&self, events: Vec<ReplayEvent>) {
        let mut state = self.inner.state.lock().await;
        state.events.extend(events);
    }

    /// Drop all pushed events and reset the pivot. Playback state (running
    /// task, observers, rate) survives; the next pushed batch starts fresh.
    pub async fn clear_events(&self) {
        let mut state = self.inner.state.lock().await;
        state.events.clear();
        state.buffer.clear();
        state.clock.reset(Instant::now());
    }

    pub fn register_observer(&self, observer: Arc<dyn ReplayEventsObserver>) {
        self.inner.observers.lock().unwrap().push(observer);
    }

    pub fn unregister_observer(&self, observer: &Arc<dyn ReplayEventsObserver>) {
        self.inner
            .observers
            .lock()
            .unwrap()
            .retain(|o| !Arc::ptr_eq(o, observer));
    }

    pub fn unregister_observers(&self) {
        self.inner.observers.lock().unwrap().clear();
    }

    /// Stream events from a lazy source through the internal buffer. Any
    /// previous source is closed; the pivot re-anchors at the attach
    /// instant.
    pub async fn attach_source(&self, source: Box<dyn EventSource>) {
        let mut state = self.inner.state.lock().await;
        state.buffer.attach_source(source).await;
        let state = &mut *state;
        state.clock.reanchor(Instant::now(), &state.events);
    }

    /// Start (or restart) the playback task.
    pub async fn play(&self) {
        let mut state = self.inner.state.lock().await;
        if let Some(task) = state.task.take() {
            task.abort();
        }
        {
            let state = &mut *state;
            state.clock.reanchor(Instant::now(), &state.events);
        }
        self.inner.running.store(true, Ordering::SeqCst);
        info!(
            session = %self.inner.session,
            events = state.events.len(),
            "replay started"
        );
        state.task = Some(spawn_playback_task(
            self.inner.clone(),
            self.tick_interval,
            self.idle_interval,
        ));
    }

    /// Cancel the playback task without clearing any state.
    pub async fn stop(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        let mut state = self.inner.state.lock().await;
        if let Some(task) = state.task.take() {
            task.abort();
            info!(session = %self.inner.session, "replay stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Scale how fast simulated time advances relative to the wall clock.
    /// 0.0 pauses playback without stopping the task.
    pub async fn playback_speed(&self, scale: f64) -> Result<(), ReplayError> {
        let mut state = self.inner.state.lock().await;
        let state = &mut *state;
        state.clock.set_scale(Instant::now(), scale, &state.events)
    }

    /// Seek to `offset_secs` past the first event.
    pub async fn seek_to(&self, offset_secs: f64) -> Result<(), ReplayError> {
        let mut state = self.inner.state.lock().await;
        let state = &mut *state;
        state
            .clock
            .seek_to_offset(Instant::now(), offset_secs, &state.events)
    }

    /// Seek to a previously pushed event.
    pub async fn seek_to_event(&self, event: &ReplayEvent) -> Result<(), ReplayError> {
        let mut state = self.inner.state.lock().await;
        let state = &mut *state;
        state
            .clock
            .seek_to_event(Instant::now(), event, &state.events)
    }

    /// Deliver only the first location event, synchronously, bypassing the
    /// scheduler. Used to seed the camera/GPS position before playback.
    ///
    /// With an attached source the pending sequence may still be empty, so
    /// buffered events are pulled through until a location shows up.
    pub async fn play_first_location(&self) {
        let first = {
            let mut guard = self.inner.state.lock().await;
            let state = &mut *guard;
            loop {
                if let Some(event) = state.events.first_location() {
                    break Some(event.clone());
                }
                state.buffer.refill().await;
                if state.buffer.is_empty() {
                    break None;
                }
                while let Some(event) = state.buffer.pop() {
                    state.events.push(event);
                }
            }
        };
        if let Some(event) = first {
            deliver(&self.inner, &[event]);
        }
    }

    /// Last-minus-first pushed event timestamp.
    pub async fn duration_seconds(&self) -> Result<f64, ReplayError> {
        let state = self.inner.state.lock().await;
        state.events.duration_seconds()
    }

    /// Convenience teardown: stop, drop observers, clear events.
    pub async fn finish(&self) {
        self.stop().await;
        self.unregister_observers();
        self.clear_events().await;
    }
}

impl Drop for HistoryPlayer {
    fn drop(&mut self) {
        self.inner.running.store(false, Ordering::SeqCst);
        if let Ok(mut state) = self.inner.state.try_lock() {
            if let Some(task) = state.task.take() {
                task.abort();
            }
        }
    }
}

/// The cooperative playback loop: once per tick, refill the buffer, feed
/// its output into the sequence when the unplayed remainder runs low,
/// deliver every event the simulated clock has crossed, then sleep out the
/// rest of the tick. With nothing left to play it drops to the idle
/// interval instead of busy-looping.
fn spawn_playback_task(
    inner: Arc<PlayerInner>,
    tick_interval: Duration,
    idle_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if !inner.running.load(Ordering::SeqCst) {
                break;
            }
            let tick_started = Instant::now();

            let (batch, idle) = {
                let mut guard = inner.state.lock().await;
                let state = &mut *guard;

                state.buffer.refill().await;
                let unplayed = state.events.len().saturating_sub(state.clock.pivot_index());
                if unplayed < state.buffer.threshold() {
                    for _ in 0..state.buffer.batch_size() {
                        match state.buffer.pop() {
                            Some(event) => state.events.push(event),
                            None => break,
                        }
                    }
                }

                let range = match state.clock.take_due(Instant::now(), &state.events) {
                    Ok(range) => range,
                    Err(err) => {
                        error!(session = %inner.session, %err, "replay clock failed, stopping playback");
                        inner.running.store(false, Ordering::SeqCst);
                        break;
                    }
                };
                let batch: Vec<ReplayEvent> = range
                    .filter_map(|i| state.events.get(i).cloned())
                    .collect();
                let idle = state.clock.pivot_index() >= state.events.len()
                    && !state.buffer.has_pending();
                (batch, idle)
            };

            if !batch.is_empty() {
                debug!(count = batch.len(), "delivering replay batch");
                deliver(&inner, &batch);
            }

            let interval = if idle { idle_interval } else { tick_interval };
            tokio::time::sleep_until(tick_started + interval).await;
        }
    })
}

/// Fan a batch out to every registered observer. Runs without holding the
/// state lock so observers may call back into the player.
fn deliver(inner: &PlayerInner, batch: &[ReplayEvent]) {
    let observers: Vec<Arc<dyn ReplayEventsObserver>> =
        inner.observers.lock().unwrap().clone();
    for observer in observers {
        observer.replay_events(batch);
    }
}
