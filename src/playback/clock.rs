use std::ops::Range;

use tokio::time::Instant;

use crate::error::ReplayError;
use crate::event::{EventSequence, ReplayEvent};

/// The forward-only simulated-time pivot of a playback session.
///
/// Holds the event-time and wall-clock anchors set at the last pivot reset,
/// the rate multiplier, and the index of the next unconsumed event. All
/// mutation happens through explicit samples passed in by the playback task,
/// which keeps the clock deterministic under virtual time.
#[derive(Debug)]
pub struct ReplayClock {
    /// Event-time at the last pivot reset, seconds.
    history_time_offset: f64,
    /// Wall-clock at the last pivot reset.
    simulator_time_offset: Instant,
    time_scale: f64,
    /// Next unconsumed event.
    pivot_index: usize,
    last_sample: Option<Instant>,
    /// Whether the event-time anchor was taken from a real event. Until
    /// then the first sample that sees events re-anchors on them, so traces
    /// with absolute epoch timestamps start playing immediately.
    anchored: bool,
}

impl ReplayClock {
    pub fn new(now: Instant) -> Self {
        Self {
            history_time_offset: 0.0,
            simulator_time_offset: now,
            time_scale: 1.0,
            pivot_index: 0,
            last_sample: None,
            anchored: false,
        }
    }

    pub fn pivot_index(&self) -> usize {
        self.pivot_index
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Re-anchor at the current pivot: wall-clock restarts at `now`,
    /// event-time restarts at the pivot event (or the last event when the
    /// sequence is already exhausted). Called on play and on stream attach.
    pub fn reanchor(&mut self, now: Instant, events: &EventSequence) {
        self.reset_pivot(now, self.pivot_index, events);
    }

    /// Full reset back to the start of an empty or replaced sequence.
    pub fn reset(&mut self, now: Instant) {
        self.history_time_offset = 0.0;
        self.simulator_time_offset = now;
        self.pivot_index = 0;
        self.last_sample = None;
        self.anchored = false;
    }

    /// Which events have happened since the last sample?
    ///
    /// Computes the simulated event-time reached at `now` and hands back the
    /// range of events from the pivot whose timestamps it has crossed,
    /// advancing the pivot past them. Sampling with a wall-clock earlier
    /// than the previous sample is a rewind and fails.
    pub fn take_due(
        &mut self,
        now: Instant,
        events: &EventSequence,
    ) -> Result<Range<usize>, ReplayError> {
        if let Some(last) = self.last_sample {
            if now < last {
                return Err(ReplayError::Rewind {
                    behind_secs: (last - now).as_secs_f64(),
                });
            }
        }
        self.last_sample = Some(now);

        if !self.anchored {
            self.reset_pivot(now, self.pivot_index, events);
            if !self.anchored {
                return Ok(self.pivot_index..self.pivot_index);
            }
        }

        let elapsed = now.duration_since(self.simulator_time_offset).as_secs_f64();
        let simulated_time = self.history_time_offset + elapsed * self.time_scale;

        let start = self.pivot_index;
        let mut end = start;
        while let Some(event) = events.get(end) {
            // A paused clock never crosses the pivot.
            let due = if self.time_scale == 0.0 {
                event.event_timestamp() < simulated_time
            } else {
                event.event_timestamp() <= simulated_time
            };
            if !due {
                break;
            }
            end += 1;
        }
        self.pivot_index = end;
        Ok(start..end)
    }

    /// Seek to the first event at or after `offset_secs` past the first
    /// event's timestamp.
    pub fn seek_to_offset(
        &mut self,
        now: Instant,
        offset_secs: f64,
        events: &EventSequence,
    ) -> Result<(), ReplayError> {
        let first = events
            .first()
            .ok_or(ReplayError::EmptyHistory)?
            .event_timestamp();
        let duration = events.duration_seconds()?;
        if offset_secs > duration {
            return Err(ReplayError::SeekOutOfRange {
                offset_secs,
                duration_secs: duration,
            });
        }

        let target = first + offset_secs;
        let index = events
            .position_at_or_after(target)
            .unwrap_or_else(|| events.len());
        self.reset_pivot(now, index, events);
        Ok(())
    }

    /// Seek to an event that was previously pushed.
    pub fn seek_to_event(
        &mut self,
        now: Instant,
        event: &ReplayEvent,
        events: &EventSequence,
    ) -> Result<(), ReplayError> {
        let index = events
            .position_of(event)
            .ok_or(ReplayError::SeekEventNotFound)?;
        self.reset_pivot(now, index, events);
        Ok(())
    }

    /// Change the rate at which simulated time advances. 0.0 pauses without
    /// stopping the task; negative rates are rejected.
    pub fn set_scale(
        &mut self,
        now: Instant,
        scale: f64,
        events: &EventSequence,
    ) -> Result<(), ReplayError> {
        if scale < 0.0 {
            return Err(ReplayError::NegativePlaybackSpeed(scale));
        }
        self.reset_pivot(now, self.pivot_index, events);
        self.time_scale = scale;
        Ok(())
    }

    fn reset_pivot(&mut self, now: Instant, pivot_index: usize, events: &EventSequence) {
        self.simulator_time_offset = now;
        let anchor = events
            .get(pivot_index)
            .or_else(|| events.last())
            .map(|e| e.event_timestamp());
        self.history_time_offset = anchor.unwrap_or(0.0);
        self.anchored = anchor.is_some();
        self.pivot_index = pivot_index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ReplayEvent;
    use std::time::Duration;

    fn sequence(timestamps: &[f64]) -> EventSequence {
        let mut events = EventSequence::new();
        for &ts in timestamps {
            events.push(ReplayEvent::status(ts));
        }
        events
    }

    #[test]
    fn test_events_become_due_as_time_advances() {
        let t0 = Instant::now();
        let events = sequence(&[10.0, 11.0, 13.0]);
        let mut clock = ReplayClock::new(t0);
        clock.reanchor(t0, &events);

        // First sample at the anchor instant releases the pivot event.
        assert_eq!(clock.take_due(t0, &events).unwrap(), 0..1);
        assert_eq!(
            clock
                .take_due(t0 + Duration::from_millis(1500), &events)
                .unwrap(),
            1..2
        );
        // Nothing new until 13.0 is crossed.
        assert_eq!(
            clock
                .take_due(t0 + Duration::from_millis(2000), &events)
                .unwrap(),
            2..2
        );
        assert_eq!(
            clock
                .take_due(t0 + Duration::from_millis(3000), &events)
                .unwrap(),
            2..3
        );
    }

    #[test]
    fn test_first_sample_anchors_on_late_events() {
        let t0 = Instant::now();
        let mut clock = ReplayClock::new(t0);
        let empty = EventSequence::new();
        assert!(clock
            .take_due(t0 + Duration::from_secs(2), &empty)
            .unwrap()
            .is_empty());

        // Events with absolute epoch timestamps stream in later; the next
        // sample anchors on them instead of waiting out decades of
        // event-time.
        let events = sequence(&[1580777612.853, 1580777613.853]);
        let range = clock
            .take_due(t0 + Duration::from_secs(3), &events)
            .unwrap();
        assert_eq!(range, 0..1);
        let range = clock
            .take_due(t0 + Duration::from_secs(4), &events)
            .unwrap();
        assert_eq!(range, 1..2);
    }

    #[test]
    fn test_rewinding_sample_fails() {
        let t0 = Instant::now();
        let events = sequence(&[0.0, 1.0]);
        let mut clock = ReplayClock::new(t0);
        clock.reanchor(t0, &events);

        clock
            .take_due(t0 + Duration::from_secs(5), &events)
            .unwrap();
        let result = clock.take_due(t0 + Duration::from_secs(3), &events);
        assert!(matches!(result, Err(ReplayError::Rewind { .. })));
    }

    #[test]
    fn test_elapsed_simulated_time_is_monotonic() {
        let t0 = Instant::now();
        let events = sequence(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let mut clock = ReplayClock::new(t0);
        clock.reanchor(t0, &events);

        let mut delivered_through = 0;
        for millis in [0, 700, 1400, 2100, 2800] {
            let range = clock
                .take_due(t0 + Duration::from_millis(millis), &events)
                .unwrap();
            assert!(range.start == delivered_through);
            assert!(range.end >= range.start);
            delivered_through = range.end;
        }
    }

    #[test]
    fn test_scale_speeds_up_delivery() {
        let t0 = Instant::now();
        let events = sequence(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let mut clock = ReplayClock::new(t0);
        clock.reanchor(t0, &events);
        clock.set_scale(t0, 4.0, &events).unwrap();

        // 1 wall second at 4x crosses events 0..4.
        let range = clock
            .take_due(t0 + Duration::from_secs(1), &events)
            .unwrap();
        assert_eq!(range, 0..5);
    }

    #[test]
    fn test_zero_scale_pauses() {
        let t0 = Instant::now();
        let events = sequence(&[5.0, 6.0]);
        let mut clock = ReplayClock::new(t0);
        clock.reanchor(t0, &events);
        clock.set_scale(t0, 0.0, &events).unwrap();

        let range = clock
            .take_due(t0 + Duration::from_secs(60), &events)
            .unwrap();
        assert!(range.is_empty());
    }

    #[test]
    fn test_negative_scale_rejected() {
        let t0 = Instant::now();
        let events = sequence(&[0.0]);
        let mut clock = ReplayClock::new(t0);
        assert!(matches!(
            clock.set_scale(t0, -1.0, &events),
            Err(ReplayError::NegativePlaybackSpeed(_))
        ));
    }

    #[test]
    fn test_seek_to_offset_picks_next_event() {
        let t0 = Instant::now();
        let events = sequence(&[0.0, 2.0, 4.0]);
        let mut clock = ReplayClock::new(t0);
        clock.seek_to_offset(t0, 1.0, &events).unwrap();

        let range = clock.take_due(t0, &events).unwrap();
        assert_eq!(range, 1..2);
    }

    #[test]
    fn test_seek_to_duration_releases_final_event() {
        let t0 = Instant::now();
        let events = sequence(&[0.0, 2.0, 4.0]);
        let mut clock = ReplayClock::new(t0);
        clock
            .seek_to_offset(t0, events.duration_seconds().unwrap(), &events)
            .unwrap();

        let range = clock.take_due(t0, &events).unwrap();
        assert_eq!(range, 2..3);
    }

    #[test]
    fn test_seek_past_duration_fails() {
        let t0 = Instant::now();
        let events = sequence(&[0.0, 2.0, 4.0]);
        let mut clock = ReplayClock::new(t0);
        assert!(matches!(
            clock.seek_to_offset(t0, 4.1, &events),
            Err(ReplayError::SeekOutOfRange { .. })
        ));
    }

    #[test]
    fn test_seek_to_unknown_event_fails() {
        let t0 = Instant::now();
        let events = sequence(&[1.853, 3.085]);
        let mut clock = ReplayClock::new(t0);
        let missing = ReplayEvent::status(2.452);
        assert!(matches!(
            clock.seek_to_event(t0, &missing, &events),
            Err(ReplayError::SeekEventNotFound)
        ));
    }

    #[test]
    fn test_seek_to_event_replays_from_it() {
        let t0 = Instant::now();
        let target = ReplayEvent::status(2.452);
        let mut events = sequence(&[1.853]);
        events.push(target.clone());
        events.push(ReplayEvent::status(3.085));

        let mut clock = ReplayClock::new(t0);
        clock.seek_to_event(t0, &target, &events).unwrap();
        let range = clock
            .take_due(t0 + Duration::from_secs(5), &events)
            .unwrap();
        assert_eq!(range, 1..3);
    }
}
