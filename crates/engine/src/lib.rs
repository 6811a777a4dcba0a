// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Leveling engine: the reconcile pass and its per-population dispatch

mod controller;
mod error;
mod reconciler;
mod scheduler;

pub use controller::Controller;
pub use error::ReconcileError;
pub use reconciler::{
    LevelAction, LevelingReconciler, ReconcileOutcome, ReconcilerConfig, Requeue,
    DEFAULT_REQUEUE_AFTER,
};
pub use scheduler::Scheduler;
