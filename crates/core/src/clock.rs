// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time source for requeue deadlines

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A clock that provides the current time
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;

    /// Instant at which a requeue armed now with `delay` comes due
    fn deadline_after(&self, delay: Duration) -> Instant {
        self.now() + delay
    }
}

/// Wall clock used by the daemon
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually driven clock for controller and scheduler tests
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move time forward; every clone observes the change
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
