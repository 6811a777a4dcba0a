// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requeue timers, at most one per population

use lv_core::ObjectRef;
use std::collections::BTreeMap;
use std::time::Instant;

/// Pending requeue deadlines keyed by population.
///
/// Arming a timer for a population that already has one replaces the old
/// deadline, so a population never has two pending passes.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: BTreeMap<ObjectRef, Instant>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer for `target` to fire at `deadline`
    pub fn set_timer(&mut self, target: ObjectRef, deadline: Instant) {
        self.timers.insert(target, deadline);
    }

    pub fn cancel_timer(&mut self, target: &ObjectRef) -> bool {
        self.timers.remove(target).is_some()
    }

    /// Remove and return every timer due at or before `now`, earliest first
    pub fn fired_timers(&mut self, now: Instant) -> Vec<ObjectRef> {
        let mut due: Vec<(Instant, ObjectRef)> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(target, deadline)| (*deadline, target.clone()))
            .collect();
        due.sort();

        for (_, target) in &due {
            self.timers.remove(target);
        }
        due.into_iter().map(|(_, target)| target).collect()
    }

    pub fn deadline(&self, target: &ObjectRef) -> Option<Instant> {
        self.timers.get(target).copied()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().min().copied()
    }

    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
