// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, polling, shutdown.

use std::time::Instant;

use lv_adapters::{ClusterError, KubectlAdapter, TracedClusterAdapter};
use lv_core::{
    ChangeEvent, EntropyError, SecureRandom, SystemClock, UuidIdGen, EXIT_ENTROPY_UNAVAILABLE,
};
use lv_engine::{Controller, LevelingReconciler};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::watch::PopulationPoller;

/// Cluster adapter used by the daemon
pub type DaemonCluster = TracedClusterAdapter<KubectlAdapter>;

/// Controller with concrete adapter types
pub type DaemonController = Controller<DaemonCluster, SecureRandom, UuidIdGen, SystemClock>;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Entropy(#[from] EntropyError),

    #[error("initial population listing failed: {0}")]
    Cluster(#[from] ClusterError),
}

impl LifecycleError {
    /// Process exit status for a failed startup
    pub fn exit_code(&self) -> u8 {
        match self {
            LifecycleError::Entropy(_) => EXIT_ENTROPY_UNAVAILABLE as u8,
            LifecycleError::Cluster(_) => 1,
        }
    }
}

/// Daemon state during operation
pub struct Daemon {
    pub controller: DaemonController,
    poller: PopulationPoller<DaemonCluster>,
    start_time: Instant,
}

impl Daemon {
    fn new(cluster: DaemonCluster, config: &Config) -> Self {
        let reconciler = LevelingReconciler::new(
            cluster.clone(),
            SecureRandom::new(),
            UuidIdGen,
            config.reconciler(),
        );
        Self {
            controller: Controller::new(reconciler, SystemClock),
            poller: PopulationPoller::new(cluster, config.namespace.clone(), config.scope),
            start_time: Instant::now(),
        }
    }

    /// Poll the cluster and dispatch what changed. Listing failures are retried next poll.
    pub async fn poll(&mut self) {
        match self.poller.poll().await {
            Ok(events) => self.dispatch(&events),
            Err(e) => warn!(error = %e, "change poll failed"),
        }
    }

    fn dispatch(&mut self, events: &[ChangeEvent]) {
        for event in events {
            self.controller.handle_change(event);
        }
    }

    /// Let in-flight passes finish, then stop
    pub async fn shutdown(&mut self) {
        info!("Shutting down daemon...");
        self.controller.drain().await;
        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "Daemon shutdown complete"
        );
    }
}

/// Build the daemon and run the first poll.
///
/// Fails when the entropy source cannot be read or the cluster cannot be
/// listed, so a misconfigured daemon exits instead of idling.
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    SecureRandom::new().try_draw_u64()?;

    let cluster = TracedClusterAdapter::new(KubectlAdapter::new(config.kubectl.clone()));
    let mut daemon = Daemon::new(cluster, config);

    let events = daemon.poller.poll().await?;
    info!(populations = daemon.poller.known(), "initial listing complete");
    daemon.dispatch(&events);

    Ok(daemon)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
