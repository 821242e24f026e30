use crate::error::ReplayError;
use crate::event::ReplayEvent;

/// An ordered collection of replay events.
///
/// Index 0 is the oldest event. The sequence is append-only while recording
/// and consumed front-to-back during playback; the scheduler keeps its own
/// pivot index into it rather than removing entries.
#[derive(Debug, Default, Clone)]
pub struct EventSequence {
    events: Vec<ReplayEvent>,
}

impl EventSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ReplayEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = ReplayEvent>) {
        self.events.extend(events);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ReplayEvent> {
        self.events.get(index)
    }

    pub fn first(&self) -> Option<&ReplayEvent> {
        self.events.first()
    }

    pub fn last(&self) -> Option<&ReplayEvent> {
        self.events.last()
    }

    pub fn as_slice(&self) -> &[ReplayEvent] {
        &self.events
    }

    /// Index of the first event equal to `event`, if it was ever pushed.
    pub fn position_of(&self, event: &ReplayEvent) -> Option<usize> {
        self.events.iter().position(|e| e == event)
    }

    /// Index of the first event whose timestamp is at least `timestamp`.
    pub fn position_at_or_after(&self, timestamp: f64) -> Option<usize> {
        self.events
            .iter()
            .position(|e| e.event_timestamp() >= timestamp)
    }

    /// The first location sample in the sequence, if any.
    pub fn first_location(&self) -> Option<&ReplayEvent> {
        self.events.iter().find(|e| e.is_location())
    }

    /// Last-minus-first event timestamp.
    pub fn duration_seconds(&self) -> Result<f64, ReplayError> {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => {
                Ok(last.event_timestamp() - first.event_timestamp())
            }
            _ => Err(ReplayError::EmptyHistory),
        }
    }
}
