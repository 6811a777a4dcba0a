// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling change detection
//!
//! Each poll lists populations and their instances and reports the
//! differences from the previous poll as change events.

use lv_adapters::{ClusterAdapter, ClusterError};
use lv_core::{ChangeEvent, ChangeKind, InstanceScope, ObjectRef, ScopeMode};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug)]
struct Snapshot {
    generation: Option<u64>,
    /// `None` until the first successful listing
    instances: Option<BTreeSet<String>>,
}

/// Diffs successive cluster listings into change events
pub struct PopulationPoller<A> {
    cluster: A,
    namespace: Option<String>,
    scope: ScopeMode,
    known: HashMap<ObjectRef, Snapshot>,
}

impl<A: ClusterAdapter> PopulationPoller<A> {
    pub fn new(cluster: A, namespace: Option<String>, scope: ScopeMode) -> Self {
        Self {
            cluster,
            namespace,
            scope,
            known: HashMap::new(),
        }
    }

    /// List the cluster once and return what changed since the last poll.
    ///
    /// Only a failed population listing is an error; a failed instance
    /// listing skips that population until the next poll.
    pub async fn poll(&mut self) -> Result<Vec<ChangeEvent>, ClusterError> {
        let populations = self
            .cluster
            .list_populations(self.namespace.as_deref())
            .await?;

        let mut events = Vec::new();
        let mut seen = BTreeSet::new();
        for population in populations {
            let target = population.target;
            seen.insert(target.clone());

            let added = !self.known.contains_key(&target);
            let snapshot = self
                .known
                .entry(target.clone())
                .or_insert_with(|| Snapshot {
                    generation: population.generation,
                    instances: None,
                });
            if added {
                events.push(ChangeEvent::population(ChangeKind::Added, target.clone()));
            } else if snapshot.generation != population.generation {
                snapshot.generation = population.generation;
                events.push(ChangeEvent::population(ChangeKind::Modified, target.clone()));
            }

            let scope = InstanceScope::for_population(&target, self.scope);
            match self.cluster.list_instances(&scope).await {
                Ok(instances) => {
                    let names: BTreeSet<String> =
                        instances.into_iter().map(|instance| instance.name).collect();
                    let changed = snapshot
                        .instances
                        .as_ref()
                        .is_some_and(|previous| *previous != names);
                    if changed {
                        events.push(ChangeEvent::instances(ChangeKind::Modified, target.clone()));
                    }
                    snapshot.instances = Some(names);
                }
                Err(e) => {
                    tracing::warn!(population = %target, error = %e, "instance listing failed");
                }
            }
        }

        let gone: Vec<ObjectRef> = self
            .known
            .keys()
            .filter(|target| !seen.contains(*target))
            .cloned()
            .collect();
        for target in gone {
            self.known.remove(&target);
            events.push(ChangeEvent::population(ChangeKind::Deleted, target));
        }

        Ok(events)
    }

    /// Number of populations seen by the last poll
    pub fn known(&self) -> usize {
        self.known.len()
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
