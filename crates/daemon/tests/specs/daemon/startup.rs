//! Daemon startup specs
//!
//! Verify `leveld run` refuses to start without a reachable cluster.

use crate::prelude::*;

#[test]
fn run_fails_when_kubectl_is_missing() {
    let temp = Project::empty();
    let config = temp.file(
        "leveld.toml",
        "[kubectl]\nbinary = \"/nonexistent/kubectl\"\n",
    );

    temp.leveld()
        .args(["run", "--config"])
        .args([&config])
        .fails()
        .stderr_has("initial population listing failed");
}

#[test]
fn run_logs_to_configured_file() {
    let temp = Project::empty();
    let log = temp.path().join("logs").join("leveld.log");
    let config = temp.file(
        "leveld.toml",
        &format!(
            "log_file = \"{}\"\n\n[kubectl]\nbinary = \"/nonexistent/kubectl\"\n",
            log.display()
        ),
    );

    temp.leveld()
        .args(["run", "--config"])
        .args([&config])
        .fails();

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("Starting leveld"), "log:\n{}", contents);
    assert!(
        contents.contains("Failed to start daemon"),
        "log:\n{}",
        contents
    );
}

#[test]
fn run_rejects_invalid_config_before_starting() {
    let temp = Project::empty();
    let config = temp.file("leveld.toml", "poll_interval = \"0s\"\n");

    temp.leveld()
        .args(["run", "--config"])
        .args([&config])
        .fails()
        .stderr_has("poll_interval must be greater than zero");
}
