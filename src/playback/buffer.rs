use std::collections::VecDeque;

use tracing::debug;

use crate::event::ReplayEvent;
use crate::source::EventSource;

/// Refill when the queue drops below this many events.
pub const DEFAULT_BUFFER_THRESHOLD: usize = 100;
/// Events pulled from the source per refill batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// A bounded queue between a lazy event source and the playback cadence.
///
/// The buffer pulls from its source in batches whenever occupancy drops
/// below the threshold, so slow file I/O never stalls a scheduler tick. It
/// owns at most one source at a time; attaching a new one closes the old
/// one first.
pub struct EventBuffer {
    queue: VecDeque<ReplayEvent>,
    source: Option<Box<dyn EventSource>>,
    threshold: usize,
    batch_size: usize,
    exhausted: bool,
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::with_tuning(DEFAULT_BUFFER_THRESHOLD, DEFAULT_BATCH_SIZE)
    }

    pub fn with_tuning(threshold: usize, batch_size: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(threshold + batch_size),
            source: None,
            threshold,
            batch_size: batch_size.max(1),
            exhausted: false,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// True while the queue or the attached source still holds events.
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty() || (self.source.is_some() && !self.exhausted)
    }

    /// Swap in a new source: the previous one is closed and released, and
    /// the first refill happens immediately.
    pub async fn attach_source(&mut self, source: Box<dyn EventSource>) {
        if let Some(mut previous) = self.source.take() {
            previous.close();
        }
        self.source = Some(source);
        self.exhausted = false;
        self.refill().await;
    }

    /// Top the queue back up to the threshold, pulling batch-sized chunks.
    ///
    /// Idempotent and safe to call opportunistically, e.g. once per
    /// scheduler tick: at or above the threshold, or with an exhausted
    /// source, it does nothing.
    pub async fn refill(&mut self) {
        while self.queue.len() < self.threshold && !self.exhausted {
            let Some(source) = self.source.as_mut() else {
                return;
            };
            let mut pulled = 0;
            while pulled < self.batch_size {
                match source.next_event().await {
                    Some(event) => {
                        self.queue.push_back(event);
                        pulled += 1;
                    }
                    None => {
                        debug!(buffered = self.queue.len(), "event source exhausted");
                        self.exhausted = true;
                        break;
                    }
                }
            }
        }
    }

    pub fn pop(&mut self) -> Option<ReplayEvent> {
        self.queue.pop_front()
    }

    /// Close the source and discard everything buffered. Used when switching
    /// logs or resetting a session.
    pub fn clear(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
        }
        self.queue.clear();
        self.exhausted = false;
    }
}
