// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-population dispatch of reconcile passes
//!
//! Passes for one population never overlap: a trigger arriving while a pass
//! is in flight is folded into a single rerun once it completes. Passes for
//! different populations run as independent tokio tasks.

use crate::reconciler::{LevelingReconciler, ReconcileOutcome, Requeue};
use crate::scheduler::Scheduler;
use lv_adapters::ClusterAdapter;
use lv_core::{ChangeEvent, Clock, IdGen, LoopPhase, LoopSignal, ObjectRef, RandomSource};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};

#[derive(Debug, Default)]
struct Slot {
    phase: LoopPhase,
    rerun: bool,
    /// Phase reported by the pass in flight
    progress: Option<watch::Receiver<LoopPhase>>,
}

impl Slot {
    fn current(&self) -> LoopPhase {
        match &self.progress {
            Some(progress) if self.phase.is_busy() => *progress.borrow(),
            _ => self.phase,
        }
    }
}

type Finished = (ObjectRef, Result<ReconcileOutcome, JoinError>);

/// Owns the loop state of every known population
pub struct Controller<A, R, I, C> {
    reconciler: Arc<LevelingReconciler<A, R, I>>,
    clock: C,
    scheduler: Scheduler,
    slots: HashMap<ObjectRef, Slot>,
    tasks: JoinSet<Finished>,
}

impl<A, R, I, C> Controller<A, R, I, C>
where
    A: ClusterAdapter,
    R: RandomSource,
    I: IdGen,
    C: Clock,
{
    pub fn new(reconciler: LevelingReconciler<A, R, I>, clock: C) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            clock,
            scheduler: Scheduler::new(),
            slots: HashMap::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Route a change event to its population. Returns whether a pass was started.
    pub fn handle_change(&mut self, event: &ChangeEvent) -> bool {
        if !event.triggers_reconcile() {
            tracing::debug!(event = %event, "ignoring change");
            return false;
        }
        tracing::debug!(event = %event, "change observed");
        self.enqueue(event.target().clone())
    }

    /// Start a pass for `target`, or mark a rerun if one is already running.
    /// Returns whether a pass was started.
    pub fn enqueue(&mut self, target: ObjectRef) -> bool {
        let slot = self.slots.entry(target.clone()).or_default();
        if slot.phase.is_busy() {
            slot.rerun = true;
            tracing::debug!(population = %target, "pass in flight, coalescing");
            return false;
        }
        slot.phase = slot.phase.on(LoopSignal::Triggered);
        let (progress, reported) = watch::channel(slot.phase);
        slot.progress = Some(reported);
        self.scheduler.cancel_timer(&target);
        self.spawn(target, progress);
        true
    }

    fn spawn(&mut self, target: ObjectRef, progress: watch::Sender<LoopPhase>) {
        let reconciler = Arc::clone(&self.reconciler);
        let key = target.clone();
        // The inner task isolates panics so the outer one can still report its target
        self.tasks.spawn(async move {
            let pass = tokio::spawn(async move {
                reconciler.reconcile_reporting(&key, &progress).await
            });
            (target, pass.await)
        });
    }

    /// Enqueue every population whose requeue timer expired
    pub fn fire_due_timers(&mut self) -> usize {
        let due = self.scheduler.fired_timers(self.clock.now());
        let count = due.len();
        for target in due {
            tracing::trace!(population = %target, "requeue timer fired");
            self.enqueue(target);
        }
        count
    }

    /// Wait for one pass to finish and apply its outcome.
    ///
    /// Returns `None` when nothing is in flight. The outcome is `None` when
    /// the pass panicked; that case is retried like any other failure.
    pub async fn join_next(&mut self) -> Option<(ObjectRef, Option<ReconcileOutcome>)> {
        loop {
            match self.tasks.join_next().await? {
                Ok((target, result)) => {
                    let outcome = self.complete(&target, result);
                    return Some((target, outcome));
                }
                Err(e) => tracing::error!(error = %e, "reconcile task lost"),
            }
        }
    }

    fn complete(
        &mut self,
        target: &ObjectRef,
        result: Result<ReconcileOutcome, JoinError>,
    ) -> Option<ReconcileOutcome> {
        let retry = Requeue::After(self.reconciler.config().requeue_after);
        let slot = self.slots.entry(target.clone()).or_default();

        if let Some(progress) = slot.progress.take() {
            if *progress.borrow() == LoopPhase::Correcting {
                slot.phase = slot.phase.on(LoopSignal::Imbalanced);
            }
        }

        let (requeue, outcome) = match result {
            Ok(outcome) => (outcome.requeue, Some(outcome)),
            Err(e) => {
                tracing::error!(population = %target, error = %e, "reconcile panicked");
                (retry, None)
            }
        };

        match requeue {
            Requeue::After(delay) => {
                slot.phase = slot.phase.on(LoopSignal::Settled);
                self.scheduler
                    .set_timer(target.clone(), self.clock.deadline_after(delay));
            }
            Requeue::OnChange => {
                slot.phase = slot.phase.on(LoopSignal::Vanished);
                self.scheduler.cancel_timer(target);
            }
        }
        tracing::debug!(population = %target, phase = %slot.phase, "pass finished");

        let rerun = std::mem::take(&mut slot.rerun);
        let idle = slot.phase == LoopPhase::Idle;
        if rerun {
            self.enqueue(target.clone());
        } else if idle {
            self.slots.remove(target);
        }
        outcome
    }

    /// Wait for in-flight passes without starting new ones
    pub async fn drain(&mut self) {
        let pending = self.tasks.len();
        if pending > 0 {
            tracing::info!(pending, "waiting for in-flight passes");
        }
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "reconcile task lost during drain");
            }
        }
    }

    /// Current phase of `target`, as reported by its pass while one runs
    pub fn phase(&self, target: &ObjectRef) -> LoopPhase {
        self.slots
            .get(target)
            .map(Slot::current)
            .unwrap_or_default()
    }

    /// Earliest pending requeue deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn deadline(&self, target: &ObjectRef) -> Option<Instant> {
        self.scheduler.deadline(target)
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
