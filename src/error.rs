use thiserror::Error;

/// Errors surfaced by the replay engine.
///
/// All of these are precondition-class failures: the caller asked for
/// something the current playback state cannot satisfy. Malformed records in
/// a trace file are not errors at this level, they are logged and skipped by
/// the source that reads them.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The simulated clock was sampled with a wall-clock time earlier than a
    /// previous sample. Playback is forward-only.
    #[error("cannot rewind replay time: sample is {behind_secs:.3}s behind the previous sample")]
    Rewind { behind_secs: f64 },

    /// A seek offset landed outside the pushed events.
    #[error("seek offset {offset_secs:.3}s is outside the replay duration {duration_secs:.3}s")]
    SeekOutOfRange {
        offset_secs: f64,
        duration_secs: f64,
    },

    /// The event passed to a seek was never pushed to the player.
    #[error("seek target event was never pushed to this player")]
    SeekEventNotFound,

    /// The traffic-aware driver needs per-segment distance/speed annotations.
    #[error("route geometry is missing distance/speed annotations for {expected} segments")]
    MissingAnnotations { expected: usize },

    /// An operation that needs at least one pushed event found none.
    #[error("no events have been pushed to this player")]
    EmptyHistory,

    /// Playback speed must be zero (paused) or positive.
    #[error("playback speed must be >= 0.0, got {0}")]
    NegativePlaybackSpeed(f64),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
