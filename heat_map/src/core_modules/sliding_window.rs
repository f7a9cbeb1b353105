// THEORY:
// The `SlidingWindow` is a bounded FIFO of the most recent frames. It owns the
// frames outright: a frame is moved in on push and moved back out when it ages
// out, so the caller can undo exactly what that frame contributed.
//
// The window never underflows. A frame is only evicted while the window is at
// capacity, and capacity is at least one.

use std::collections::VecDeque;

/// Whether the window has reached its capacity yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Fewer than `capacity` frames are buffered.
    NotFull,
    /// Every push now evicts the oldest frame.
    Full,
}

#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    frames: VecDeque<T>,
    capacity: usize,
}

impl<T> SlidingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends the newest frame. Returns the oldest frame when it had to make room.
    pub fn push(&mut self, frame: T) -> Option<T> {
        let evicted = if self.frames.len() == self.capacity {
            self.frames.pop_front()
        } else {
            None
        };
        self.frames.push_back(frame);
        evicted
    }

    pub fn state(&self) -> WindowState {
        if self.frames.len() >= self.capacity {
            WindowState::Full
        } else {
            WindowState::NotFull
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recently pushed frame.
    pub fn newest(&self) -> Option<&T> {
        self.frames.back()
    }

    /// Buffered frames, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_then_evicts_oldest_first() {
        let mut window = SlidingWindow::new(2);
        assert_eq!(window.state(), WindowState::NotFull);
        assert_eq!(window.push(1), None);
        assert_eq!(window.state(), WindowState::NotFull);
        assert_eq!(window.push(2), None);
        assert_eq!(window.state(), WindowState::Full);
        assert_eq!(window.push(3), Some(1));
        assert_eq!(window.push(4), Some(2));
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(window.newest(), Some(&4));
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn capacity_of_one_replaces_every_frame() {
        let mut window = SlidingWindow::new(1);
        assert_eq!(window.push("a"), None);
        assert_eq!(window.push("b"), Some("a"));
        assert_eq!(window.state(), WindowState::Full);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let window: SlidingWindow<u8> = SlidingWindow::new(0);
        assert_eq!(window.capacity(), 1);
        assert!(window.is_empty());
    }
}
