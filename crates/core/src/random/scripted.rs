// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted random source for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{RandomError, RandomSource};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Script {
    draws: VecDeque<u64>,
    bounds: Vec<u64>,
}

/// Replays a fixed sequence of draws and records every requested bound
#[derive(Clone, Default)]
pub struct ScriptedRandom {
    script: Arc<Mutex<Script>>,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = u64>) -> Self {
        let source = Self::default();
        for draw in draws {
            source.push(draw);
        }
        source
    }

    /// Queue another draw
    pub fn push(&self, draw: u64) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .draws
            .push_back(draw);
    }

    /// Bounds requested so far, in order
    pub fn bounds(&self) -> Vec<u64> {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .bounds
            .clone()
    }
}

impl RandomSource for ScriptedRandom {
    fn draw_bounded(&self, bound: u64) -> Result<u64, RandomError> {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script.bounds.push(bound);

        if bound == 0 {
            return Err(RandomError::EmptyRange);
        }
        let value = script
            .draws
            .pop_front()
            .ok_or(RandomError::Exhausted { bound })?;
        if value >= bound {
            return Err(RandomError::OutOfRange { value, bound });
        }
        Ok(value)
    }
}

#[cfg(test)]
#[path = "scripted_tests.rs"]
mod tests;
