use async_trait::async_trait;

use crate::error::ReplayError;
use crate::event::ReplayEvent;

/// A lazy, closeable, restartable iterator over replay events.
///
/// Implementations are backed by an in-memory list, a streaming trace file,
/// or a generated kinematic trace. The buffer owns exactly one source at a
/// time and pulls from it in batches.
///
/// `close` must be safe to call any number of times; a closed source simply
/// reports no further events. I/O problems degrade the source to exhausted
/// rather than surfacing errors into the playback loop.
#[async_trait]
pub trait EventSource: Send {
    /// True when another event can be pulled.
    async fn has_next(&mut self) -> bool;

    /// Pull the next event, or `None` when the source is exhausted or
    /// closed.
    async fn next_event(&mut self) -> Option<ReplayEvent>;

    /// Rewind to the first event. File-backed sources reopen their file.
    async fn restart(&mut self) -> Result<(), ReplayError>;

    /// Release the underlying resource. Idempotent.
    fn close(&mut self);
}
