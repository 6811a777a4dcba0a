// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::reconciler::{LevelAction, ReconcilerConfig, DEFAULT_REQUEUE_AFTER};
use lv_adapters::{ClusterCall, FakeClusterAdapter};
use lv_core::{
    ChangeKind, FakeClock, Population, ScriptedRandom, SequentialIdGen, WorkerInstance,
};
use std::time::Duration;
use yare::parameterized;

type TestController = Controller<FakeClusterAdapter, ScriptedRandom, SequentialIdGen, FakeClock>;

fn wild() -> ObjectRef {
    ObjectRef::new("arena", "wild")
}

fn tame() -> ObjectRef {
    ObjectRef::new("arena", "tame")
}

struct Harness {
    cluster: FakeClusterAdapter,
    rng: ScriptedRandom,
    clock: FakeClock,
    controller: TestController,
}

fn setup() -> Harness {
    let cluster = FakeClusterAdapter::new();
    let rng = ScriptedRandom::default();
    let clock = FakeClock::new();
    let reconciler = LevelingReconciler::new(
        cluster.clone(),
        rng.clone(),
        SequentialIdGen::new(),
        ReconcilerConfig::default(),
    );
    let controller = Controller::new(reconciler, clock.clone());
    Harness {
        cluster,
        rng,
        clock,
        controller,
    }
}

fn fetches(cluster: &FakeClusterAdapter, target: &ObjectRef) -> usize {
    cluster
        .calls()
        .iter()
        .filter(|call| matches!(call, ClusterCall::GetPopulation { target: t } if t == target))
        .count()
}

#[tokio::test]
async fn finished_pass_arms_the_requeue_timer() {
    let mut h = setup();
    h.cluster.insert_population(Population::new(wild(), 0));

    assert!(h.controller.enqueue(wild()));
    assert_eq!(h.controller.phase(&wild()), LoopPhase::Evaluating);
    assert_eq!(h.controller.in_flight(), 1);

    let (target, outcome) = h.controller.join_next().await.unwrap();

    assert_eq!(target, wild());
    assert_eq!(outcome.unwrap().action, LevelAction::Hold);
    assert_eq!(h.controller.phase(&wild()), LoopPhase::Scheduled);
    assert_eq!(
        h.controller.deadline(&wild()),
        Some(h.clock.now() + DEFAULT_REQUEUE_AFTER)
    );
    assert_eq!(h.controller.in_flight(), 0);
}

#[tokio::test]
async fn corrective_pass_still_ends_scheduled() {
    let mut h = setup();
    h.cluster.insert_population(Population::new(wild(), 2));
    h.rng.push(2);

    h.controller.enqueue(wild());
    let (_, outcome) = h.controller.join_next().await.unwrap();

    assert_eq!(
        outcome.unwrap().action,
        LevelAction::Spawn {
            planned: 2,
            created: 2
        }
    );
    assert_eq!(h.controller.phase(&wild()), LoopPhase::Scheduled);
    assert_eq!(h.cluster.instances().len(), 2);
}

#[tokio::test]
async fn correcting_is_visible_before_the_pass_is_joined() {
    let mut h = setup();
    h.cluster.insert_population(Population::new(wild(), 2));
    h.rng.push(1);

    h.controller.enqueue(wild());
    tokio::time::timeout(Duration::from_secs(5), async {
        while h.controller.phase(&wild()) != LoopPhase::Correcting {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert!(h.controller.phase(&wild()).is_busy());

    h.controller.join_next().await.unwrap();

    assert_eq!(h.controller.phase(&wild()), LoopPhase::Scheduled);
}

/// Clock whose deadlines land one second later than `now + delay`
#[derive(Clone)]
struct LateClock(FakeClock);

impl Clock for LateClock {
    fn now(&self) -> Instant {
        self.0.now()
    }

    fn deadline_after(&self, delay: Duration) -> Instant {
        self.0.now() + delay + Duration::from_secs(1)
    }
}

#[tokio::test]
async fn requeue_deadline_comes_from_the_clock() {
    let cluster = FakeClusterAdapter::new();
    cluster.insert_population(Population::new(wild(), 0));
    let clock = FakeClock::new();
    let reconciler = LevelingReconciler::new(
        cluster,
        ScriptedRandom::default(),
        SequentialIdGen::new(),
        ReconcilerConfig::default(),
    );
    let mut controller = Controller::new(reconciler, LateClock(clock.clone()));

    controller.enqueue(wild());
    controller.join_next().await.unwrap();

    assert_eq!(
        controller.deadline(&wild()),
        Some(clock.now() + DEFAULT_REQUEUE_AFTER + Duration::from_secs(1))
    );
}

#[tokio::test]
async fn due_timers_start_the_next_pass() {
    let mut h = setup();
    h.cluster.insert_population(Population::new(wild(), 1));
    h.cluster
        .seed_instances([WorkerInstance::new("seed", "arena")]);

    h.controller.enqueue(wild());
    h.controller.join_next().await;

    // Not yet due
    h.clock.advance(Duration::from_secs(29));
    assert_eq!(h.controller.fire_due_timers(), 0);

    h.clock.advance(Duration::from_secs(1));
    assert_eq!(h.controller.fire_due_timers(), 1);
    assert_eq!(h.controller.phase(&wild()), LoopPhase::Evaluating);
    assert_eq!(h.controller.deadline(&wild()), None);

    h.controller.join_next().await;
    assert_eq!(fetches(&h.cluster, &wild()), 2);
}

#[tokio::test]
async fn concurrent_triggers_coalesce_into_one_rerun() {
    let mut h = setup();
    h.cluster.insert_population(Population::new(wild(), 0));

    assert!(h.controller.enqueue(wild()));
    assert!(!h.controller.enqueue(wild()));
    assert!(!h.controller.enqueue(wild()));
    assert_eq!(h.controller.in_flight(), 1);

    // Completing the first pass dispatches exactly one rerun
    h.controller.join_next().await;
    assert_eq!(h.controller.in_flight(), 1);
    assert_eq!(h.controller.phase(&wild()), LoopPhase::Evaluating);

    h.controller.join_next().await;
    assert_eq!(h.controller.in_flight(), 0);
    assert_eq!(fetches(&h.cluster, &wild()), 2);
}

#[tokio::test]
async fn different_populations_run_concurrently() {
    let mut h = setup();
    h.cluster.insert_population(Population::new(wild(), 0));
    h.cluster.insert_population(Population::new(tame(), 0));

    assert!(h.controller.enqueue(wild()));
    assert!(h.controller.enqueue(tame()));
    assert_eq!(h.controller.in_flight(), 2);

    let mut finished = vec![
        h.controller.join_next().await.unwrap().0,
        h.controller.join_next().await.unwrap().0,
    ];
    finished.sort();
    assert_eq!(finished, vec![tame(), wild()]);
    assert!(h.controller.join_next().await.is_none());
}

#[tokio::test]
async fn vanished_population_goes_idle_without_timer() {
    let mut h = setup();

    h.controller.enqueue(wild());
    let (_, outcome) = h.controller.join_next().await.unwrap();

    assert_eq!(outcome.unwrap().requeue, Requeue::OnChange);
    assert_eq!(h.controller.phase(&wild()), LoopPhase::Idle);
    assert_eq!(h.controller.next_deadline(), None);
}

#[tokio::test]
async fn failed_pass_is_retried_on_the_timer() {
    let mut h = setup();
    h.cluster.insert_population(Population::new(wild(), 3));
    h.cluster.fail(lv_adapters::ClusterOp::ListInstances);

    h.controller.enqueue(wild());
    let (_, outcome) = h.controller.join_next().await.unwrap();

    assert!(!outcome.unwrap().is_ok());
    assert_eq!(h.controller.phase(&wild()), LoopPhase::Scheduled);
    assert_eq!(
        h.controller.deadline(&wild()),
        Some(h.clock.now() + DEFAULT_REQUEUE_AFTER)
    );
}

#[parameterized(
    population_added = { ChangeEvent::population(ChangeKind::Added, ObjectRef::new("arena", "wild")), true },
    population_modified = { ChangeEvent::population(ChangeKind::Modified, ObjectRef::new("arena", "wild")), true },
    population_deleted = { ChangeEvent::population(ChangeKind::Deleted, ObjectRef::new("arena", "wild")), false },
    instances_modified = { ChangeEvent::instances(ChangeKind::Modified, ObjectRef::new("arena", "wild")), true },
    instances_deleted = { ChangeEvent::instances(ChangeKind::Deleted, ObjectRef::new("arena", "wild")), true },
)]
#[test_macro(tokio::test)]
async fn change_events_trigger_passes(event: ChangeEvent, starts: bool) {
    let mut h = setup();
    h.cluster.insert_population(Population::new(wild(), 0));

    assert_eq!(h.controller.handle_change(&event), starts);
    assert_eq!(h.controller.in_flight(), usize::from(starts));
    h.controller.drain().await;
}

#[tokio::test]
async fn change_cancels_the_pending_timer() {
    let mut h = setup();
    h.cluster.insert_population(Population::new(wild(), 0));

    h.controller.enqueue(wild());
    h.controller.join_next().await;
    assert!(h.controller.deadline(&wild()).is_some());

    h.controller
        .handle_change(&ChangeEvent::population(ChangeKind::Modified, wild()));
    assert_eq!(h.controller.deadline(&wild()), None);

    h.controller.join_next().await;
    assert!(h.controller.deadline(&wild()).is_some());
}

#[tokio::test]
async fn drain_waits_without_rescheduling() {
    let mut h = setup();
    h.cluster.insert_population(Population::new(wild(), 0));

    h.controller.enqueue(wild());
    h.controller.enqueue(wild());
    h.controller.drain().await;

    assert_eq!(h.controller.in_flight(), 0);
    assert_eq!(fetches(&h.cluster, &wild()), 1);
}
