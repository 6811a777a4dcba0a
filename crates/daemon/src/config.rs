// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file

use lv_adapters::KubectlConfig;
use lv_core::{InstanceTemplate, ScopeMode, TemplateError};
use lv_engine::{ReconcilerConfig, DEFAULT_REQUEUE_AFTER};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("invalid template: {0}")]
    Template(#[from] TemplateError),
}

/// Settings for `leveld`; every key is optional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Delay before every requeue and retry
    #[serde(with = "humantime_serde")]
    pub requeue_after: Duration,
    /// Period of the change poller
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Watch a single namespace; all namespaces when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub scope: ScopeMode,
    /// Log to this file instead of stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub kubectl: KubectlConfig,
    pub template: InstanceTemplate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            requeue_after: DEFAULT_REQUEUE_AFTER,
            poll_interval: DEFAULT_POLL_INTERVAL,
            namespace: None,
            scope: ScopeMode::default(),
            log_file: None,
            kubectl: KubectlConfig::default(),
            template: InstanceTemplate::default(),
        }
    }
}

impl Config {
    /// Load from `path`, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::parse(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requeue_after.is_zero() {
            return Err(ConfigError::ZeroInterval("requeue_after"));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("poll_interval"));
        }
        self.template.validate()?;
        Ok(())
    }

    pub fn reconciler(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            requeue_after: self.requeue_after,
            scope: self.scope,
            template: self.template.clone(),
        }
    }

    /// Effective configuration as TOML
    pub fn render(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
