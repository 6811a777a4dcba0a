// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change notifications that re-arm the leveling loop

use crate::population::ObjectRef;
use std::fmt;

/// Kind of observed change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// What changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSubject {
    /// The population object itself
    Population(ObjectRef),
    /// The instance set counted against a population
    Instances(ObjectRef),
}

/// A change observed in the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub subject: ChangeSubject,
}

impl ChangeEvent {
    pub fn population(kind: ChangeKind, target: ObjectRef) -> Self {
        Self {
            kind,
            subject: ChangeSubject::Population(target),
        }
    }

    pub fn instances(kind: ChangeKind, target: ObjectRef) -> Self {
        Self {
            kind,
            subject: ChangeSubject::Instances(target),
        }
    }

    /// Population whose loop this event concerns
    pub fn target(&self) -> &ObjectRef {
        match &self.subject {
            ChangeSubject::Population(target) | ChangeSubject::Instances(target) => target,
        }
    }

    /// False for population deletions, which never trigger a pass
    pub fn triggers_reconcile(&self) -> bool {
        !matches!(
            (&self.subject, self.kind),
            (ChangeSubject::Population(_), ChangeKind::Deleted)
        )
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        };
        match &self.subject {
            ChangeSubject::Population(target) => write!(f, "population:{}:{}", kind, target),
            ChangeSubject::Instances(target) => write!(f, "instances:{}:{}", kind, target),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
