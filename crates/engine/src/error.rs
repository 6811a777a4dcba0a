// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the reconcile pass

use lv_adapters::ClusterError;
use lv_core::RandomError;
use thiserror::Error;

/// Failures inside one reconcile pass.
///
/// None of these escape the pass: each is logged and answered with a retry
/// after the fixed requeue interval.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("unable to fetch population: {0}")]
    Fetch(#[source] ClusterError),
    #[error("unable to list instances: {0}")]
    List(#[source] ClusterError),
    #[error("unable to create instance {name}: {source}")]
    Create { name: String, source: ClusterError },
    #[error("unable to update status: {0}")]
    StatusUpdate(#[source] ClusterError),
    #[error("unable to delete instance {name}: {source}")]
    Delete { name: String, source: ClusterError },
    #[error("random draw failed: {0}")]
    Draw(#[from] RandomError),
}
