// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unique suffixes for worker instance names

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates unique identifiers
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self) -> String;

    /// Instance name of the form `<prefix>-<id>`
    fn instance_name(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next())
    }
}

/// UUID v4 generator; names stay unique across controller restarts
#[derive(Clone, Copy, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Counter-based generator for tests
#[derive(Clone, Default)]
pub struct SequentialIdGen {
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        n.to_string()
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
