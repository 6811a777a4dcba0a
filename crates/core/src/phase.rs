// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-population loop phase
//!
//! Leveling never finishes: every pass ends scheduled for the next one, and
//! only the disappearance of the population returns it to idle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a population is in its leveling loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopPhase {
    /// No pass pending; waiting for a change event
    #[default]
    Idle,
    /// Reading desired state and listing instances
    Evaluating,
    /// Creating or deleting instances; reported by the pass once its plan
    /// touches an instance
    Correcting,
    /// Pass finished, timer armed for the next one
    Scheduled,
}

/// Input driving [`LoopPhase`] transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopSignal {
    /// Timer fired or change observed
    Triggered,
    /// The pass found an imbalance to correct
    Imbalanced,
    /// The pass ended and requeued itself
    Settled,
    /// The population no longer exists
    Vanished,
}

impl LoopPhase {
    /// Apply a signal. Signals that do not apply to the phase leave it unchanged.
    pub fn on(self, signal: LoopSignal) -> LoopPhase {
        match (self, signal) {
            (_, LoopSignal::Vanished) => LoopPhase::Idle,
            (LoopPhase::Idle | LoopPhase::Scheduled, LoopSignal::Triggered) => {
                LoopPhase::Evaluating
            }
            (LoopPhase::Evaluating, LoopSignal::Imbalanced) => LoopPhase::Correcting,
            (LoopPhase::Evaluating | LoopPhase::Correcting, LoopSignal::Settled) => {
                LoopPhase::Scheduled
            }
            (phase, _) => phase,
        }
    }

    /// A reconcile for this population is currently running
    pub fn is_busy(&self) -> bool {
        matches!(self, LoopPhase::Evaluating | LoopPhase::Correcting)
    }
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoopPhase::Idle => "idle",
            LoopPhase::Evaluating => "evaluating",
            LoopPhase::Correcting => "correcting",
            LoopPhase::Scheduled => "scheduled",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
