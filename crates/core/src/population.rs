// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desired and observed state of a leveled population

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespaced reference to a population object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub namespace: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Target instance count, owned by the configuration store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredState {
    /// Absent on the wire reads as zero
    #[serde(default)]
    pub max_instances: u32,
}

/// Status counters written back after each spawn.
///
/// `living` is a running estimate taken during the last reconcile, not an
/// authoritative count; decisions always re-list the live instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedState {
    #[serde(default)]
    pub living: u64,
    #[serde(default)]
    pub total_spawned: u64,
}

impl ObservedState {
    /// Record one successful spawn given how many instances now exist
    pub fn record_spawn(&mut self, living: u64) {
        self.living = living;
        self.total_spawned += 1;
    }
}

/// A population object as fetched from the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Population {
    pub target: ObjectRef,
    pub spec: DesiredState,
    pub status: ObservedState,
    /// Spec generation; status writes do not bump it
    pub generation: Option<u64>,
}

impl Population {
    pub fn new(target: ObjectRef, max_instances: u32) -> Self {
        Self {
            target,
            spec: DesiredState { max_instances },
            status: ObservedState::default(),
            generation: None,
        }
    }
}

#[cfg(test)]
#[path = "population_tests.rs"]
mod tests;
