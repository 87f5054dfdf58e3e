use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Moved,
    Up,
}

/// A touch reported by the platform, in physical pixels with the origin at
/// the top-left corner of the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub pos: Vec2,
    /// Finger index for multitouch; 0 for a mouse.
    pub index: u32,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, x: f32, y: f32, index: u32) -> Self {
        Self {
            phase,
            pos: Vec2::new(x, y),
            index,
        }
    }
}

/// Touches collected between frames.
/// The platform pushes events as they arrive; the graphics subsystem drains
/// them at the start of each frame.
#[derive(Debug, Default)]
pub struct TouchQueue {
    events: Vec<TouchEvent>,
}

impl TouchQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(16),
        }
    }

    pub fn push(&mut self, event: TouchEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<TouchEvent> {
        std::mem::take(&mut self.events)
    }

    /// Iterate over pending events without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &TouchEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain_in_order() {
        let mut q = TouchQueue::new();
        q.push(TouchEvent::new(TouchPhase::Down, 10.0, 20.0, 0));
        q.push(TouchEvent::new(TouchPhase::Up, 10.0, 25.0, 0));
        assert_eq!(q.len(), 2);
        let events = q.drain();
        assert_eq!(events[0].phase, TouchPhase::Down);
        assert_eq!(events[1].pos, Vec2::new(10.0, 25.0));
        assert!(q.is_empty());
    }
}
