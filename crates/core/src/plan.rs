// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leveling decision for one reconcile pass
//!
//! The plan moves toward the target in a random step instead of jumping
//! straight to it: an under-provisioned population spawns anywhere between
//! zero and all of the missing instances, an over-provisioned one loses at
//! most a single instance.

use crate::random::{RandomError, RandomSource};
use std::cmp::Ordering;

/// Corrective step chosen for one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelPlan {
    /// Population already matches its target
    Hold,
    /// Spawn `count` of the `missing` instances (`count <= missing`)
    Spawn { missing: usize, count: usize },
    /// Delete the instance at `index` in the current listing
    Delete { index: usize },
    /// The deletion draw landed one past the last index; nothing is deleted
    SkipDelete { draw: usize },
}

impl LevelPlan {
    /// Decide the step for `current` live instances against `max_instances`
    pub fn decide(
        max_instances: u32,
        current: usize,
        rng: &impl RandomSource,
    ) -> Result<Self, RandomError> {
        let desired = max_instances as usize;
        match desired.cmp(&current) {
            Ordering::Equal => Ok(LevelPlan::Hold),
            Ordering::Greater => {
                let missing = desired - current;
                // Inclusive of `missing`: a pass may fill the whole gap
                let count = rng.draw_bounded(missing as u64 + 1)? as usize;
                Ok(LevelPlan::Spawn { missing, count })
            }
            Ordering::Less => {
                // The range deliberately includes `current` itself
                let draw = rng.draw_bounded(current as u64 + 1)? as usize;
                if draw < current {
                    Ok(LevelPlan::Delete { index: draw })
                } else {
                    Ok(LevelPlan::SkipDelete { draw })
                }
            }
        }
    }

    /// Whether carrying out the plan touches any instance
    pub fn is_corrective(&self) -> bool {
        match self {
            LevelPlan::Spawn { count, .. } => *count > 0,
            LevelPlan::Delete { .. } => true,
            LevelPlan::Hold | LevelPlan::SkipDelete { .. } => false,
        }
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
