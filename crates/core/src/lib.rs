// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! lv-core: data model and pure decision logic for population leveling
//!
//! This crate provides:
//! - Desired/observed state of populations and their worker instances
//! - The CSPRNG-backed random source behind scaling decisions
//! - The leveling plan and the per-population loop phase machine
//! - Change events, clock and id abstractions

pub mod clock;
pub mod event;
pub mod id;
pub mod instance;
pub mod phase;
pub mod plan;
pub mod population;
pub mod random;

pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{ChangeEvent, ChangeKind, ChangeSubject};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use instance::{
    InstanceScope, InstanceTemplate, PortProtocol, ScopeMode, TemplateError, WorkerInstance,
    OWNER_LABEL,
};
pub use phase::{LoopPhase, LoopSignal};
pub use plan::LevelPlan;
pub use population::{DesiredState, ObjectRef, ObservedState, Population};
pub use random::{
    EntropyError, RandomError, RandomSource, SecureRandom, EXIT_ENTROPY_UNAVAILABLE,
};

#[cfg(any(test, feature = "test-support"))]
pub use random::ScriptedRandom;
