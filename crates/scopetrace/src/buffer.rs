//! Append-only event buffer.

use crate::events::Event;

/// Growable event buffer.
///
/// Insertion order is emission order. There is no capacity bound; the buffer
/// is emptied by [`TraceBuffer::take`] at export time and starts every
/// session again with the configured capacity.
#[derive(Debug, Default)]
pub struct TraceBuffer {
    events: Vec<Event>,
    capacity: usize,
}

impl TraceBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an event.
    #[inline]
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Move all events out, leaving an empty buffer with the initial capacity.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::replace(&mut self.events, Vec::with_capacity(self.capacity))
    }

    /// Put previously taken events back in front of anything pushed since.
    pub fn restore(&mut self, mut events: Vec<Event>) {
        events.append(&mut self.events);
        self.events = events;
    }

    /// Get an event by position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate over buffered events in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    fn named(ts: u32) -> Event {
        Event {
            kind: EventKind::ThreadName(format!("t{ts}")),
            ts,
            tid: 1,
        }
    }

    #[test]
    fn push_keeps_emission_order() {
        let mut buffer = TraceBuffer::new();
        for ts in [5, 3, 9] {
            buffer.push(named(ts));
        }

        let order: Vec<u32> = buffer.iter().map(|e| e.ts).collect();
        assert_eq!(order, vec![5, 3, 9]);
        assert_eq!(buffer.get(1).unwrap().ts, 3);
        assert!(buffer.get(3).is_none());
    }

    #[test]
    fn take_empties_buffer() {
        let mut buffer = TraceBuffer::with_capacity(4);
        buffer.push(named(1));
        buffer.push(named(2));

        let taken = buffer.take();
        assert_eq!(taken.len(), 2);
        assert!(buffer.is_empty());
        assert!(buffer.events.capacity() >= 4);
    }

    #[test]
    fn restore_prepends() {
        let mut buffer = TraceBuffer::new();
        buffer.push(named(1));
        buffer.push(named(2));
        let taken = buffer.take();

        buffer.push(named(3));
        buffer.restore(taken);

        let order: Vec<u32> = buffer.iter().map(|e| e.ts).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
