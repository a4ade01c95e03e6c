//! Render decoupling: a single-slot frame channel between the simulation
//! thread and the render thread.
//!
//! One writer, one reader, bounded double-buffering: the simulation thread
//! blocks in `publish` until the previous frame has been consumed, so the
//! renderer can never fall more than one frame behind and the simulation
//! can never outrun an unconsumed slot.

use std::sync::{Condvar, Mutex};

use gridlock_logic::snapshot::FrameSnapshot;
use log::info;

pub trait Renderer {
    fn draw(&mut self, frame: &FrameSnapshot);
}

/// Headless renderer: logs a one-line summary at an interval. The real
/// terminal renderer lives outside this crate; this keeps networked runs
/// observable without one.
pub struct LogRenderer {
    every: u64,
}

impl LogRenderer {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Renderer for LogRenderer {
    fn draw(&mut self, frame: &FrameSnapshot) {
        if frame.tick % self.every != 0 && !frame.state.is_terminal() {
            return;
        }
        let alive = frame.seats.iter().filter(|s| s.alive).count();
        info!(
            "tick {} state {:?} floor {} seats alive {}/{}",
            frame.tick,
            frame.state,
            frame.floor,
            alive,
            frame.seats.len()
        );
    }
}

struct FrameSlot {
    frame: Option<FrameSnapshot>,
    closed: bool,
}

pub struct FrameChannel {
    slot: Mutex<FrameSlot>,
    cond: Condvar,
}

impl Default for FrameChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameChannel {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(FrameSlot {
                frame: None,
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Publish a frame, waiting for the previous one to be consumed.
    /// Returns false once the channel is closed.
    pub fn publish(&self, frame: FrameSnapshot) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        while slot.frame.is_some() && !slot.closed {
            slot = self
                .cond
                .wait(slot)
                .unwrap_or_else(|e| e.into_inner());
        }
        if slot.closed {
            return false;
        }
        slot.frame = Some(frame);
        self.cond.notify_all();
        true
    }

    /// Take the next frame, waiting for one. `None` means closed and
    /// drained.
    pub fn consume(&self) -> Option<FrameSnapshot> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(frame) = slot.frame.take() {
                self.cond.notify_all();
                return Some(frame);
            }
            if slot.closed {
                return None;
            }
            slot = self
                .cond
                .wait(slot)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    pub fn close(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.closed = true;
        self.cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_logic::tick::RunState;
    use std::sync::Arc;
    use std::thread;

    fn frame(tick: u64) -> FrameSnapshot {
        FrameSnapshot {
            tick,
            state: RunState::Running,
            floor: 0,
            grid: Vec::new(),
            seats: Vec::new(),
        }
    }

    #[test]
    fn frames_arrive_in_order() {
        let channel = Arc::new(FrameChannel::new());
        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                let mut ticks = Vec::new();
                while let Some(frame) = channel.consume() {
                    ticks.push(frame.tick);
                }
                ticks
            })
        };
        for tick in 0..10 {
            assert!(channel.publish(frame(tick)));
        }
        channel.close();
        assert_eq!(consumer.join().unwrap(), (0..10).collect::<Vec<u64>>());
    }

    #[test]
    fn close_unblocks_consumer() {
        let channel = Arc::new(FrameChannel::new());
        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.consume())
        };
        channel.close();
        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn publish_after_close_is_refused() {
        let channel = FrameChannel::new();
        channel.close();
        assert!(!channel.publish(frame(0)));
    }
}
