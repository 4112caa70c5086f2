use std::collections::VecDeque;

use crate::frame::Frame;

/// Default number of events retained before the oldest are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A recorded change, tagged with the frame it happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<K> {
    pub frame_index: u64,
    pub kind: K,
    pub message: String,
}

/// Bounded change log.
///
/// Hover updates arrive at pointer-move frequency, so the log keeps only the
/// most recent `capacity` events.
#[derive(Debug)]
pub struct EventBus<K> {
    events: VecDeque<Event<K>>,
    capacity: usize,
    dropped: u64,
}

impl<K> Default for EventBus<K> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl<K> EventBus<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn emit(&mut self, frame: Frame, kind: K, message: impl Into<String>) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(Event {
            frame_index: frame.index,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> impl Iterator<Item = &Event<K>> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events evicted because the log was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn drain(&mut self) -> Vec<Event<K>> {
        self.events.drain(..).collect()
    }
}
