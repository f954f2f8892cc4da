use super::Event;
use std::collections::VecDeque;

/// Single FIFO channel of events.
///
/// Events are consumed from the head and derived events appended to the
/// tail, so everything produced while resolving a tick is handled before the
/// next tick is admitted.
#[derive(Debug, Default)]
pub struct EventQueue {
    inner: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.inner.push_back(event);
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.inner.pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
