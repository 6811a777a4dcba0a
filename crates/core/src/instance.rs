// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker instances and the baseline workload they run

use crate::population::ObjectRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label carrying the name of the population that spawned an instance
pub const OWNER_LABEL: &str = "leveler.dev/population";

/// An ephemeral worker. Only its existence matters to leveling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerInstance {
    pub name: String,
    pub namespace: String,
    /// Owning population name, when the instance carries [`OWNER_LABEL`]
    pub owner: Option<String>,
}

impl WorkerInstance {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            owner: None,
        }
    }

    pub fn owned_by(mut self, population: impl Into<String>) -> Self {
        self.owner = Some(population.into());
        self
    }
}

/// Transport protocol of the exposed port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortProtocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl PortProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortProtocol::Tcp => "TCP",
            PortProtocol::Udp => "UDP",
            PortProtocol::Sctp => "SCTP",
        }
    }
}

/// Fixed single-container workload every spawned instance runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstanceTemplate {
    pub name_prefix: String,
    pub container: String,
    pub image: String,
    pub port_name: String,
    pub port: u16,
    pub protocol: PortProtocol,
}

impl Default for InstanceTemplate {
    fn default() -> Self {
        Self {
            name_prefix: "worker".to_string(),
            container: "worker".to_string(),
            image: "nginx:1.25-alpine".to_string(),
            port_name: "http".to_string(),
            port: 80,
            protocol: PortProtocol::Tcp,
        }
    }
}

/// Invalid instance template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template field `{0}` must not be empty")]
    Empty(&'static str),
    #[error("template port must be non-zero")]
    ZeroPort,
}

impl InstanceTemplate {
    pub fn validate(&self) -> Result<(), TemplateError> {
        for (field, value) in [
            ("name_prefix", &self.name_prefix),
            ("container", &self.container),
            ("image", &self.image),
            ("port_name", &self.port_name),
        ] {
            if value.trim().is_empty() {
                return Err(TemplateError::Empty(field));
            }
        }
        if self.port == 0 {
            return Err(TemplateError::ZeroPort);
        }
        Ok(())
    }

    /// Build a new instance for `population`, named `name`
    pub fn instantiate(&self, name: String, population: &ObjectRef) -> WorkerInstance {
        WorkerInstance::new(name, &population.namespace).owned_by(&population.name)
    }
}

/// How far instance listings reach when counting a population
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    /// Every instance in the population's namespace counts
    #[default]
    Namespace,
    /// Only instances labelled with the population's name count
    Owner,
}

/// Selection of instances counted against one population
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceScope {
    pub namespace: String,
    pub owner: Option<String>,
}

impl InstanceScope {
    pub fn for_population(target: &ObjectRef, mode: ScopeMode) -> Self {
        Self {
            namespace: target.namespace.clone(),
            owner: match mode {
                ScopeMode::Namespace => None,
                ScopeMode::Owner => Some(target.name.clone()),
            },
        }
    }

    /// Kubernetes label selector narrowing the scope, if any
    pub fn label_selector(&self) -> Option<String> {
        self.owner
            .as_ref()
            .map(|owner| format!("{}={}", OWNER_LABEL, owner))
    }

    pub fn contains(&self, instance: &WorkerInstance) -> bool {
        instance.namespace == self.namespace
            && match &self.owner {
                Some(owner) => instance.owner.as_deref() == Some(owner.as_str()),
                None => true,
            }
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
