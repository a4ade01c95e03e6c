//! Tick pacing: deadline arithmetic instead of fixed sleeps, so a slow
//! tick steals from the next sleep rather than stretching the session.

use std::thread;
use std::time::{Duration, Instant};

pub struct TickScheduler {
    next_deadline: Instant,
    budget: Duration,
}

impl TickScheduler {
    pub fn new(budget: Duration) -> Self {
        Self {
            next_deadline: Instant::now() + budget,
            budget,
        }
    }

    /// Sleep out the remainder of the current tick budget, then advance
    /// the deadline by exactly one budget. When already past the deadline
    /// this returns immediately and the loop catches up.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next_deadline > now {
            thread::sleep(self.next_deadline - now);
        }
        self.next_deadline += self.budget;
    }
}
