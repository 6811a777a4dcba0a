// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One leveling pass for one population
//!
//! Each pass re-lists the live instances, draws a bounded random step
//! toward the desired count, applies it, and asks to be run again. The
//! loop has no terminal state: only a vanished population stops requeueing.

use crate::error::ReconcileError;
use lv_adapters::ClusterAdapter;
use lv_core::{
    IdGen, InstanceScope, InstanceTemplate, LevelPlan, LoopPhase, ObjectRef, Population,
    RandomSource, ScopeMode, WorkerInstance,
};
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

/// Fixed interval between passes, also used for every retry
pub const DEFAULT_REQUEUE_AFTER: Duration = Duration::from_secs(30);

/// When the next pass should run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    /// Run again after the delay
    After(Duration),
    /// Do not schedule; wait for a change event
    OnChange,
}

/// What the pass did to the instance set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelAction {
    /// The pass stopped before deciding anything
    None,
    /// Population already at its target
    Hold,
    /// Spawn step: `created` of `planned` creations succeeded
    Spawn { planned: usize, created: usize },
    /// Deletion of the named instance was attempted
    Delete { name: String },
    /// The deletion draw fell past the listing; nothing was deleted
    DeleteSkipped,
}

/// Result of one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub requeue: Requeue,
    pub action: LevelAction,
    /// Failure that cut the pass short, already logged
    pub error: Option<ReconcileError>,
}

impl ReconcileOutcome {
    fn absent() -> Self {
        Self {
            requeue: Requeue::OnChange,
            action: LevelAction::None,
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Tunables for the reconcile pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub requeue_after: Duration,
    pub scope: ScopeMode,
    pub template: InstanceTemplate,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            requeue_after: DEFAULT_REQUEUE_AFTER,
            scope: ScopeMode::default(),
            template: InstanceTemplate::default(),
        }
    }
}

/// Drives one population's instance count toward its target
pub struct LevelingReconciler<A, R, I> {
    cluster: A,
    rng: R,
    id_gen: I,
    config: ReconcilerConfig,
}

impl<A, R, I> LevelingReconciler<A, R, I>
where
    A: ClusterAdapter,
    R: RandomSource,
    I: IdGen,
{
    pub fn new(cluster: A, rng: R, id_gen: I, config: ReconcilerConfig) -> Self {
        Self {
            cluster,
            rng,
            id_gen,
            config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Run one pass for `target`. Never fails: errors are folded into the outcome.
    pub async fn reconcile(&self, target: &ObjectRef) -> ReconcileOutcome {
        let (progress, _) = watch::channel(LoopPhase::Evaluating);
        self.reconcile_reporting(target, &progress).await
    }

    /// Like [`Self::reconcile`], publishing `Correcting` on `progress` once
    /// the pass starts creating or deleting instances
    pub async fn reconcile_reporting(
        &self,
        target: &ObjectRef,
        progress: &watch::Sender<LoopPhase>,
    ) -> ReconcileOutcome {
        let span = tracing::info_span!("reconcile", population = %target);
        self.run_pass(target, progress).instrument(span).await
    }

    async fn run_pass(
        &self,
        target: &ObjectRef,
        progress: &watch::Sender<LoopPhase>,
    ) -> ReconcileOutcome {
        let mut population = match self.cluster.get_population(target).await {
            Ok(population) => population,
            Err(e) if e.is_not_found() => {
                // Recreation arrives as a change event; nothing to retry
                tracing::debug!("population not found, waiting for changes");
                return ReconcileOutcome::absent();
            }
            Err(e) => return self.retry(LevelAction::None, ReconcileError::Fetch(e)),
        };

        let scope = InstanceScope::for_population(target, self.config.scope);
        let instances = match self.cluster.list_instances(&scope).await {
            Ok(instances) => instances,
            Err(e) => return self.retry(LevelAction::None, ReconcileError::List(e)),
        };

        let plan = match LevelPlan::decide(
            population.spec.max_instances,
            instances.len(),
            &self.rng,
        ) {
            Ok(plan) => plan,
            Err(e) => return self.retry(LevelAction::None, e.into()),
        };
        tracing::info!(
            max_instances = population.spec.max_instances,
            current = instances.len(),
            ?plan,
            "leveling"
        );
        if plan.is_corrective() {
            progress.send_replace(LoopPhase::Correcting);
        }

        match plan {
            LevelPlan::Hold => self.settled(LevelAction::Hold),
            LevelPlan::Spawn { count, .. } => {
                self.spawn(&mut population, instances.len(), count).await
            }
            LevelPlan::Delete { index } => match instances.get(index) {
                Some(victim) => self.delete(victim).await,
                None => self.settled(LevelAction::DeleteSkipped),
            },
            LevelPlan::SkipDelete { draw } => {
                tracing::info!(draw, "deletion draw past the last instance, skipping");
                self.settled(LevelAction::DeleteSkipped)
            }
        }
    }

    /// Create `planned` instances one at a time, persisting status after each.
    ///
    /// `living` counts from the listing taken at the start of the pass plus
    /// this pass's creations; it is not re-listed mid-loop. Instances created
    /// before a failure are kept.
    async fn spawn(
        &self,
        population: &mut Population,
        observed: usize,
        planned: usize,
    ) -> ReconcileOutcome {
        let template = &self.config.template;
        for created in 0..planned {
            let name = self.id_gen.instance_name(&template.name_prefix);
            let instance = template.instantiate(name, &population.target);

            if let Err(e) = self.cluster.create_instance(&instance, template).await {
                return self.retry(
                    LevelAction::Spawn { planned, created },
                    ReconcileError::Create {
                        name: instance.name,
                        source: e,
                    },
                );
            }

            population
                .status
                .record_spawn((observed + created + 1) as u64);
            if let Err(e) = self
                .cluster
                .update_status(&population.target, &population.status)
                .await
            {
                return self.retry(
                    LevelAction::Spawn {
                        planned,
                        created: created + 1,
                    },
                    ReconcileError::StatusUpdate(e),
                );
            }
        }

        self.settled(LevelAction::Spawn {
            planned,
            created: planned,
        })
    }

    /// Remove a single instance. Status counters are left untouched.
    async fn delete(&self, victim: &WorkerInstance) -> ReconcileOutcome {
        let action = LevelAction::Delete {
            name: victim.name.clone(),
        };
        match self.cluster.delete_instance(victim).await {
            Ok(()) => self.settled(action),
            Err(e) => self.retry(
                action,
                ReconcileError::Delete {
                    name: victim.name.clone(),
                    source: e,
                },
            ),
        }
    }

    fn settled(&self, action: LevelAction) -> ReconcileOutcome {
        ReconcileOutcome {
            requeue: Requeue::After(self.config.requeue_after),
            action,
            error: None,
        }
    }

    fn retry(&self, action: LevelAction, error: ReconcileError) -> ReconcileOutcome {
        tracing::error!(error = %error, "reconcile failed, retrying later");
        ReconcileOutcome {
            requeue: Requeue::After(self.config.requeue_after),
            action,
            error: Some(error),
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
