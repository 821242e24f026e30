use std::path::Path;

use tracing::info;

use crate::error::ReplayError;
use crate::event::ReplayEvent;
use crate::playback::HistoryPlayer;
use crate::source::{EventSource, HistoryFileSource};

/// Replay session over a recorded history file.
///
/// The file is read lazily: the player's buffer pulls fixed-size batches of
/// records and feeds the sequence as the pivot approaches its end, so only
/// a bounded look-ahead past the playback position is ever read ahead.
pub struct HistoryReplaySession {
    player: HistoryPlayer,
}

impl HistoryReplaySession {
    /// Open a history file and wire it into a fresh player.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let source = HistoryFileSource::open(path.as_ref()).await?;
        info!(path = %path.as_ref().display(), "replaying history file");
        let session = Self {
            player: HistoryPlayer::named("history-replay"),
        };
        session.player.attach_source(Box::new(source)).await;
        Ok(session)
    }

    /// Replay any source that speaks the event-source contract, e.g. a CSV
    /// trace.
    pub async fn from_source(source: Box<dyn EventSource>) -> Self {
        let session = Self {
            player: HistoryPlayer::named("history-replay"),
        };
        session.player.attach_source(source).await;
        session
    }

    pub fn player(&self) -> &HistoryPlayer {
        &self.player
    }

    /// Seed consumers with the first recorded location before playback, for
    /// initial camera/GPS positioning.
    pub async fn play_first_location(&self) {
        self.player.play_first_location().await;
    }

    pub async fn play(&self) {
        self.player.play().await;
    }

    pub async fn stop(&self) {
        self.player.stop().await;
    }

    pub async fn seek_to(&self, offset_secs: f64) -> Result<(), ReplayError> {
        self.player.seek_to(offset_secs).await
    }

    pub async fn playback_speed(&self, scale: f64) -> Result<(), ReplayError> {
        self.player.playback_speed(scale).await
    }

    pub async fn finish(&self) {
        self.player.finish().await;
    }

    /// Events delivered so far come straight from the player's observers;
    /// exposed here only for convenience of composing sessions.
    pub fn register_observer(
        &self,
        observer: std::sync::Arc<dyn crate::playback::ReplayEventsObserver>,
    ) {
        self.player.register_observer(observer);
    }

    pub async fn push_events(&self, events: Vec<ReplayEvent>) {
        self.player.push_events(events).await;
    }
}
