// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster access consumed by the leveling loop

mod kubectl;

pub use kubectl::{KubectlAdapter, KubectlConfig};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ClusterCall, ClusterOp, FakeClusterAdapter};

use async_trait::async_trait;
use lv_core::{InstanceScope, InstanceTemplate, ObjectRef, ObservedState, Population, WorkerInstance};
use thiserror::Error;

/// Errors from cluster operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClusterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }
}

/// Adapter for the objects the leveling loop reads and writes.
///
/// Each operation is individually atomic; nothing here spans calls.
#[async_trait]
pub trait ClusterAdapter: Clone + Send + Sync + 'static {
    /// Fetch one population
    async fn get_population(&self, target: &ObjectRef) -> Result<Population, ClusterError>;

    /// List populations, in one namespace or across all of them
    async fn list_populations(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<Population>, ClusterError>;

    /// List live instances in `scope`, in a stable order
    async fn list_instances(
        &self,
        scope: &InstanceScope,
    ) -> Result<Vec<WorkerInstance>, ClusterError>;

    /// Create an instance running `template`
    async fn create_instance(
        &self,
        instance: &WorkerInstance,
        template: &InstanceTemplate,
    ) -> Result<(), ClusterError>;

    /// Delete an instance
    async fn delete_instance(&self, instance: &WorkerInstance) -> Result<(), ClusterError>;

    /// Persist the observed-state counters of a population
    async fn update_status(
        &self,
        target: &ObjectRef,
        status: &ObservedState,
    ) -> Result<(), ClusterError>;
}
