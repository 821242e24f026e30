use async_trait::async_trait;

use crate::error::ReplayError;
use crate::event::ReplayEvent;
use crate::source::EventSource;

/// In-memory event source, mostly used for tests and for replaying short
/// recorded sequences without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryEventSource {
    events: Vec<ReplayEvent>,
    cursor: usize,
    closed: bool,
}

impl MemoryEventSource {
    pub fn new(events: Vec<ReplayEvent>) -> Self {
        Self {
            events,
            cursor: 0,
            closed: false,
        }
    }

    pub fn remaining(&self) -> usize {
        if self.closed {
            0
        } else {
            self.events.len() - self.cursor
        }
    }
}

#[async_trait]
impl EventSource for MemoryEventSource {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn events(n: usize) -> Vec<ReplayEvent> {
        (0..n).map(|i| ReplayEvent::status(i as f64)).collect()
    }

    #[tokio::test]
    async fn test_drains_in_order() {
        let mut source = MemoryEventSource::new(events(3));
        assert!(source.has_next().await);
        assert_eq!(source.next_event().await.unwrap().event_timestamp(), 0.0);
        assert_eq!(source.next_event().await.unwrap().event_timestamp(), 1.0);
        assert_eq!(source.next_event().await.unwrap().event_timestamp(), 2.0);
        assert!(!source.has_next().await);
        assert!(source.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut source = MemoryEventSource::new(events(2));
        source.close();
        source.close();
        assert!(!source.has_next().await);
        assert!(source.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_restart_rewinds() {
        let mut source = MemoryEventSource::new(events(2));
        source.next_event().await;
        source.close();
        source.restart().await.unwrap();
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_event().await.unwrap().event_timestamp(), 0.0);
    }
}
