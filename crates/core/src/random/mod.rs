// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Random draws for leveling decisions
//!
//! Spawn counts and deletion victims are drawn from the operating system's
//! CSPRNG so an outside observer cannot predict or replay scaling decisions.

mod secure;

pub use secure::{SecureRandom, EXIT_ENTROPY_UNAVAILABLE};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod scripted;
#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedRandom;

use thiserror::Error;

/// Errors from bounded draws
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RandomError {
    #[error("cannot draw from an empty range")]
    EmptyRange,
    #[error("no scripted draw left for bound {bound}")]
    Exhausted { bound: u64 },
    #[error("scripted draw {value} is outside [0, {bound})")]
    OutOfRange { value: u64, bound: u64 },
}

/// The platform entropy source could not be read
#[derive(Debug, Error)]
#[error("secure entropy source unavailable: {0}")]
pub struct EntropyError(getrandom::Error);

impl From<getrandom::Error> for EntropyError {
    fn from(err: getrandom::Error) -> Self {
        Self(err)
    }
}

/// Uniform integer draws used by the leveling plan
pub trait RandomSource: Clone + Send + Sync + 'static {
    /// Draw uniformly from `[0, bound)`. A zero bound is an error.
    fn draw_bounded(&self, bound: u64) -> Result<u64, RandomError>;
}
