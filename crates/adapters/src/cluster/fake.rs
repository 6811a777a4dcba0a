// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake cluster adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ClusterAdapter, ClusterError};
use async_trait::async_trait;
use lv_core::{InstanceScope, InstanceTemplate, ObjectRef, ObservedState, Population, WorkerInstance};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Recorded cluster call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    GetPopulation { target: ObjectRef },
    ListPopulations { namespace: Option<String> },
    ListInstances { scope: InstanceScope },
    CreateInstance { instance: WorkerInstance },
    DeleteInstance { instance: WorkerInstance },
    UpdateStatus { target: ObjectRef, status: ObservedState },
}

/// Operation kinds, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterOp {
    GetPopulation,
    ListPopulations,
    ListInstances,
    CreateInstance,
    DeleteInstance,
    UpdateStatus,
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Always,
    /// Fail only the nth call (1-based) of the operation
    Nth(usize),
}

#[derive(Default)]
struct FakeCluster {
    populations: BTreeMap<ObjectRef, Population>,
    instances: Vec<WorkerInstance>,
    calls: Vec<ClusterCall>,
    op_counts: HashMap<ClusterOp, usize>,
    failures: HashMap<ClusterOp, Failure>,
    next_generation: u64,
}

impl FakeCluster {
    /// Count the call and decide whether it is an injected failure
    fn check(&mut self, op: ClusterOp) -> Result<(), ClusterError> {
        let count = self.op_counts.entry(op).or_insert(0);
        *count += 1;
        let fails = match self.failures.get(&op) {
            Some(Failure::Always) => true,
            Some(Failure::Nth(n)) => *n == *count,
            None => false,
        };
        if fails {
            return Err(ClusterError::CommandFailed(format!("injected {:?} failure", op)));
        }
        Ok(())
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

/// In-memory cluster for testing
#[derive(Clone, Default)]
pub struct FakeClusterAdapter {
    inner: Arc<Mutex<FakeCluster>>,
}

impl FakeClusterAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeCluster> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add or replace a population; bumps its generation
    pub fn insert_population(&self, mut population: Population) {
        let mut cluster = self.lock();
        population.generation = Some(cluster.bump_generation());
        cluster
            .populations
            .insert(population.target.clone(), population);
    }

    pub fn remove_population(&self, target: &ObjectRef) -> Option<Population> {
        self.lock().populations.remove(target)
    }

    /// Change a population's target count; bumps its generation
    pub fn set_max_instances(&self, target: &ObjectRef, max_instances: u32) {
        let mut cluster = self.lock();
        let generation = cluster.bump_generation();
        if let Some(population) = cluster.populations.get_mut(target) {
            population.spec.max_instances = max_instances;
            population.generation = Some(generation);
        }
    }

    pub fn population(&self, target: &ObjectRef) -> Option<Population> {
        self.lock().populations.get(target).cloned()
    }

    /// Append existing instances without recording calls
    pub fn seed_instances(&self, instances: impl IntoIterator<Item = WorkerInstance>) {
        self.lock().instances.extend(instances);
    }

    /// Live instances in listing order
    pub fn instances(&self) -> Vec<WorkerInstance> {
        self.lock().instances.clone()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.lock().calls.clone()
    }

    /// Instances passed to create, including failed attempts
    pub fn create_calls(&self) -> Vec<WorkerInstance> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ClusterCall::CreateInstance { instance } => Some(instance),
                _ => None,
            })
            .collect()
    }

    /// Instances passed to delete, including failed attempts
    pub fn delete_calls(&self) -> Vec<WorkerInstance> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ClusterCall::DeleteInstance { instance } => Some(instance),
                _ => None,
            })
            .collect()
    }

    /// Statuses passed to update, including failed attempts
    pub fn status_updates(&self) -> Vec<ObservedState> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ClusterCall::UpdateStatus { status, .. } => Some(status),
                _ => None,
            })
            .collect()
    }

    /// Fail every call of `op`
    pub fn fail(&self, op: ClusterOp) {
        self.lock().failures.insert(op, Failure::Always);
    }

    /// Fail the nth call (1-based) of `op`, counted from adapter creation
    pub fn fail_nth(&self, op: ClusterOp, n: usize) {
        self.lock().failures.insert(op, Failure::Nth(n));
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }
}

#[async_trait]
impl ClusterAdapter for FakeClusterAdapter {
    async fn get_population(&self, target: &ObjectRef) -> Result<Population, ClusterError> {
        let mut cluster = self.lock();
        cluster.calls.push(ClusterCall::GetPopulation {
            target: target.clone(),
        });
        cluster.check(ClusterOp::GetPopulation)?;

        cluster
            .populations
            .get(target)
            .cloned()
            .ok_or_else(|| ClusterError::NotFound(target.to_string()))
    }

    async fn list_populations(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<Population>, ClusterError> {
        let mut cluster = self.lock();
        cluster.calls.push(ClusterCall::ListPopulations {
            namespace: namespace.map(str::to_string),
        });
        cluster.check(ClusterOp::ListPopulations)?;

        Ok(cluster
            .populations
            .values()
            .filter(|p| namespace.map_or(true, |ns| p.target.namespace == ns))
            .cloned()
            .collect())
    }

    async fn list_instances(
        &self,
        scope: &InstanceScope,
    ) -> Result<Vec<WorkerInstance>, ClusterError> {
        let mut cluster = self.lock();
        cluster.calls.push(ClusterCall::ListInstances {
            scope: scope.clone(),
        });
        cluster.check(ClusterOp::ListInstances)?;

        Ok(cluster
            .instances
            .iter()
            .filter(|i| scope.contains(i))
            .cloned()
            .collect())
    }

    async fn create_instance(
        &self,
        instance: &WorkerInstance,
        _template: &InstanceTemplate,
    ) -> Result<(), ClusterError> {
        let mut cluster = self.lock();
        cluster.calls.push(ClusterCall::CreateInstance {
            instance: instance.clone(),
        });
        cluster.check(ClusterOp::CreateInstance)?;

        if cluster
            .instances
            .iter()
            .any(|i| i.name == instance.name && i.namespace == instance.namespace)
        {
            return Err(ClusterError::AlreadyExists(instance.name.clone()));
        }
        cluster.instances.push(instance.clone());
        Ok(())
    }

    async fn delete_instance(&self, instance: &WorkerInstance) -> Result<(), ClusterError> {
        let mut cluster = self.lock();
        cluster.calls.push(ClusterCall::DeleteInstance {
            instance: instance.clone(),
        });
        cluster.check(ClusterOp::DeleteInstance)?;

        let before = cluster.instances.len();
        cluster
            .instances
            .retain(|i| !(i.name == instance.name && i.namespace == instance.namespace));
        if cluster.instances.len() == before {
            return Err(ClusterError::NotFound(instance.name.clone()));
        }
        Ok(())
    }

    async fn update_status(
        &self,
        target: &ObjectRef,
        status: &ObservedState,
    ) -> Result<(), ClusterError> {
        let mut cluster = self.lock();
        cluster.calls.push(ClusterCall::UpdateStatus {
            target: target.clone(),
            status: *status,
        });
        cluster.check(ClusterOp::UpdateStatus)?;

        // Status writes leave the generation alone
        let population = cluster
            .populations
            .get_mut(target)
            .ok_or_else(|| ClusterError::NotFound(target.to_string()))?;
        population.status = *status;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
