// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::cluster::{ClusterAdapter, ClusterError};
use async_trait::async_trait;
use lv_core::{InstanceScope, InstanceTemplate, ObjectRef, ObservedState, Population, WorkerInstance};
use tracing::Instrument;

/// Wrapper that adds tracing to any ClusterAdapter
#[derive(Clone)]
pub struct TracedClusterAdapter<A> {
    inner: A,
}

impl<A> TracedClusterAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[async_trait]
impl<A: ClusterAdapter> ClusterAdapter for TracedClusterAdapter<A> {
    async fn get_population(&self, target: &ObjectRef) -> Result<Population, ClusterError> {
        let span = tracing::debug_span!("cluster.get_population", population = %target);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.get_population(target).await;
            match &result {
                Ok(p) => tracing::debug!(
                    max_instances = p.spec.max_instances,
                    elapsed_ms = elapsed_ms(start),
                    "fetched"
                ),
                // Absence is routine: the object may have just been deleted
                Err(ClusterError::NotFound(_)) => tracing::debug!("population not found"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "fetch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn list_populations(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<Population>, ClusterError> {
        let result = self.inner.list_populations(namespace).await;
        match &result {
            Ok(populations) => {
                tracing::trace!(namespace, count = populations.len(), "listed populations")
            }
            Err(e) => tracing::warn!(namespace, error = %e, "population listing failed"),
        }
        result
    }

    async fn list_instances(
        &self,
        scope: &InstanceScope,
    ) -> Result<Vec<WorkerInstance>, ClusterError> {
        let span = tracing::debug_span!(
            "cluster.list_instances",
            namespace = %scope.namespace,
            owner = scope.owner.as_deref()
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.list_instances(scope).await;
            match &result {
                Ok(instances) => tracing::debug!(
                    count = instances.len(),
                    elapsed_ms = elapsed_ms(start),
                    "listed"
                ),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "list failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn create_instance(
        &self,
        instance: &WorkerInstance,
        template: &InstanceTemplate,
    ) -> Result<(), ClusterError> {
        let span = tracing::info_span!(
            "cluster.create_instance",
            name = %instance.name,
            namespace = %instance.namespace
        );
        async {
            // Precondition: the template must describe a runnable workload
            if let Err(e) = template.validate() {
                tracing::error!(error = %e, "refusing invalid template");
                return Err(ClusterError::CommandFailed(format!("invalid template: {}", e)));
            }

            tracing::debug!(image = %template.image, "creating");
            let start = std::time::Instant::now();
            let result = self.inner.create_instance(instance, template).await;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed_ms(start), "instance created"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "create failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn delete_instance(&self, instance: &WorkerInstance) -> Result<(), ClusterError> {
        let span = tracing::info_span!(
            "cluster.delete_instance",
            name = %instance.name,
            namespace = %instance.namespace
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.delete_instance(instance).await;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed_ms(start), "instance deleted"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "delete failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn update_status(
        &self,
        target: &ObjectRef,
        status: &ObservedState,
    ) -> Result<(), ClusterError> {
        let span = tracing::debug_span!(
            "cluster.update_status",
            population = %target,
            living = status.living,
            total_spawned = status.total_spawned
        );
        async {
            let result = self.inner.update_status(target, status).await;
            match &result {
                Ok(()) => tracing::debug!("status updated"),
                Err(e) => tracing::error!(error = %e, "status update failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
