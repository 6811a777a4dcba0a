// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes adapter driving `kubectl`
//!
//! Populations are custom resources; worker instances are pods. Every
//! operation is a single `kubectl` invocation exchanging JSON.

use super::{ClusterAdapter, ClusterError};
use async_trait::async_trait;
use lv_core::{
    DesiredState, InstanceScope, InstanceTemplate, ObjectRef, ObservedState, Population,
    WorkerInstance, OWNER_LABEL,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Label marking pods created by this controller
const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
const MANAGED_BY: &str = "leveld";

/// How to reach the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KubectlConfig {
    /// Path or name of the kubectl binary
    pub binary: String,
    /// Fully qualified resource name of populations
    pub resource: String,
    /// kubeconfig context; the current context when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            binary: "kubectl".to_string(),
            resource: "populations.leveler.dev".to_string(),
            context: None,
        }
    }
}

/// kubectl-backed cluster adapter
#[derive(Clone)]
pub struct KubectlAdapter {
    config: Arc<KubectlConfig>,
}

impl KubectlAdapter {
    pub fn new(config: KubectlConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    async fn run(&self, args: &[String], stdin: Option<&[u8]>) -> Result<Vec<u8>, ClusterError> {
        let mut cmd = Command::new(&self.config.binary);
        if let Some(context) = &self.config.context {
            cmd.arg("--context").arg(context);
        }
        cmd.args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| ClusterError::CommandFailed(format!("{}: {}", self.config.binary, e)))?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input)
                .await
                .map_err(|e| ClusterError::CommandFailed(e.to_string()))?;
            // Dropping the pipe closes kubectl's stdin
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ClusterError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(classify_failure(&output.stderr));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl ClusterAdapter for KubectlAdapter {
    async fn get_population(&self, target: &ObjectRef) -> Result<Population, ClusterError> {
        let stdout = self
            .run(&get_population_args(&self.config.resource, target), None)
            .await?;
        let object: PopulationObject = parse_json(&stdout)?;
        Ok(object.into_population(&target.namespace))
    }

    async fn list_populations(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<Population>, ClusterError> {
        let stdout = self
            .run(&list_populations_args(&self.config.resource, namespace), None)
            .await?;
        parse_population_list(&stdout, namespace.unwrap_or("default"))
    }

    async fn list_instances(
        &self,
        scope: &InstanceScope,
    ) -> Result<Vec<WorkerInstance>, ClusterError> {
        let stdout = self.run(&list_instances_args(scope), None).await?;
        let list: ObjectList<PodObject> = parse_json(&stdout)?;
        Ok(list
            .items
            .into_iter()
            .map(|pod| pod.into_instance(&scope.namespace))
            .collect())
    }

    async fn create_instance(
        &self,
        instance: &WorkerInstance,
        template: &InstanceTemplate,
    ) -> Result<(), ClusterError> {
        let manifest = pod_manifest(instance, template).to_string();
        let args = strings(&["create", "-f", "-", "-o", "name"]);
        self.run(&args, Some(manifest.as_bytes())).await?;
        Ok(())
    }

    async fn delete_instance(&self, instance: &WorkerInstance) -> Result<(), ClusterError> {
        self.run(&delete_instance_args(instance), None).await?;
        Ok(())
    }

    async fn update_status(
        &self,
        target: &ObjectRef,
        status: &ObservedState,
    ) -> Result<(), ClusterError> {
        self.run(
            &update_status_args(&self.config.resource, target, status),
            None,
        )
        .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    generation: Option<u64>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct PopulationObject {
    metadata: Metadata,
    spec: DesiredState,
    #[serde(default)]
    status: ObservedState,
}

impl PopulationObject {
    fn into_population(self, fallback_namespace: &str) -> Population {
        let namespace = self
            .metadata
            .namespace
            .unwrap_or_else(|| fallback_namespace.to_string());
        Population {
            target: ObjectRef::new(namespace, self.metadata.name),
            spec: self.spec,
            status: self.status,
            generation: self.metadata.generation,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PodObject {
    metadata: Metadata,
}

impl PodObject {
    fn into_instance(mut self, fallback_namespace: &str) -> WorkerInstance {
        WorkerInstance {
            owner: self.metadata.labels.remove(OWNER_LABEL),
            namespace: self
                .metadata
                .namespace
                .unwrap_or_else(|| fallback_namespace.to_string()),
            name: self.metadata.name,
        }
    }
}

/// Parse a population list item by item.
///
/// A malformed object is logged and skipped so it cannot hide its siblings.
fn parse_population_list(
    stdout: &[u8],
    fallback_namespace: &str,
) -> Result<Vec<Population>, ClusterError> {
    let list: ObjectList<serde_json::Value> = parse_json(stdout)?;
    let mut populations = Vec::with_capacity(list.items.len());
    for item in list.items {
        let name = item["metadata"]["name"].as_str().map(str::to_string);
        match serde_json::from_value::<PopulationObject>(item) {
            Ok(object) => populations.push(object.into_population(fallback_namespace)),
            Err(e) => tracing::warn!(?name, error = %e, "skipping malformed population"),
        }
    }
    Ok(populations)
}

fn parse_json<T: serde::de::DeserializeOwned>(stdout: &[u8]) -> Result<T, ClusterError> {
    serde_json::from_slice(stdout).map_err(|e| ClusterError::InvalidResponse(e.to_string()))
}

/// Map kubectl's stderr onto an error kind
fn classify_failure(stderr: &[u8]) -> ClusterError {
    let message = String::from_utf8_lossy(stderr).trim().to_string();
    if message.contains("(NotFound)") {
        ClusterError::NotFound(message)
    } else if message.contains("(AlreadyExists)") {
        ClusterError::AlreadyExists(message)
    } else {
        ClusterError::CommandFailed(message)
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn get_population_args(resource: &str, target: &ObjectRef) -> Vec<String> {
    strings(&[
        "get",
        resource,
        target.name.as_str(),
        "-n",
        target.namespace.as_str(),
        "-o",
        "json",
    ])
}

fn list_populations_args(resource: &str, namespace: Option<&str>) -> Vec<String> {
    let mut args = strings(&["get", resource, "-o", "json"]);
    match namespace {
        Some(ns) => args.extend(strings(&["-n", ns])),
        None => args.push("--all-namespaces".to_string()),
    }
    args
}

fn list_instances_args(scope: &InstanceScope) -> Vec<String> {
    let mut args = strings(&["get", "pods", "-n", scope.namespace.as_str(), "-o", "json"]);
    if let Some(selector) = scope.label_selector() {
        args.push("-l".to_string());
        args.push(selector);
    }
    args
}

fn delete_instance_args(instance: &WorkerInstance) -> Vec<String> {
    strings(&[
        "delete",
        "pod",
        instance.name.as_str(),
        "-n",
        instance.namespace.as_str(),
        "--wait=false",
    ])
}

fn update_status_args(resource: &str, target: &ObjectRef, status: &ObservedState) -> Vec<String> {
    let patch = json!({ "status": status }).to_string();
    strings(&[
        "patch",
        resource,
        target.name.as_str(),
        "-n",
        target.namespace.as_str(),
        "--subresource=status",
        "--type=merge",
        "-p",
        patch.as_str(),
    ])
}

/// Single-container pod running the baseline workload
fn pod_manifest(instance: &WorkerInstance, template: &InstanceTemplate) -> serde_json::Value {
    let mut labels = serde_json::Map::new();
    labels.insert(MANAGED_BY_LABEL.to_string(), json!(MANAGED_BY));
    if let Some(owner) = &instance.owner {
        labels.insert(OWNER_LABEL.to_string(), json!(owner));
    }

    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": instance.name,
            "namespace": instance.namespace,
            "labels": labels,
        },
        "spec": {
            "containers": [{
                "name": template.container,
                "image": template.image,
                "ports": [{
                    "name": template.port_name,
                    "protocol": template.protocol.as_str(),
                    "containerPort": template.port,
                }],
            }],
        },
    })
}

#[cfg(test)]
#[path = "kubectl_tests.rs"]
mod tests;
