//! Config check specs
//!
//! Verify `leveld check` validates and prints the effective configuration.

use crate::prelude::*;

#[test]
fn check_without_config_prints_defaults() {
    Project::empty()
        .leveld()
        .args(["check"])
        .passes()
        .stdout_has("requeue_after = \"30s\"")
        .stdout_has("poll_interval = \"5s\"")
        .stdout_has("scope = \"namespace\"")
        .stdout_has("image = \"nginx:1.25-alpine\"")
        .stdout_lacks("namespace = \"");
}

#[test]
fn check_merges_file_over_defaults() {
    let temp = Project::empty();
    let config = temp.file("leveld.toml", MINIMAL_CONFIG);

    temp.leveld()
        .args(["check", "--config"])
        .args([&config])
        .passes()
        .stdout_has("requeue_after = \"10s\"")
        .stdout_has("namespace = \"arena\"")
        .stdout_has("image = \"busybox:1.36\"")
        .stdout_has("port = 80");
}

#[test]
fn check_rejects_zero_requeue() {
    let temp = Project::empty();
    let config = temp.file("leveld.toml", "requeue_after = \"0s\"\n");

    temp.leveld()
        .args(["check", "-c"])
        .args([&config])
        .fails()
        .stderr_has("requeue_after must be greater than zero");
}

#[test]
fn check_rejects_empty_image() {
    let temp = Project::empty();
    let config = temp.file("leveld.toml", "[template]\nimage = \"\"\n");

    temp.leveld()
        .args(["check", "--config"])
        .args([&config])
        .fails()
        .stderr_has("image");
}

#[test]
fn check_rejects_unknown_keys() {
    let temp = Project::empty();
    let config = temp.file("leveld.toml", "max_pokemons = 5\n");

    temp.leveld()
        .args(["check", "--config"])
        .args([&config])
        .fails()
        .stderr_has("cannot parse config");
}

#[test]
fn check_reports_missing_file() {
    let temp = Project::empty();

    temp.leveld()
        .args(["check", "--config", "nope.toml"])
        .fails()
        .stderr_has("cannot read config");
}
