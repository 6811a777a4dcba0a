//! CLI help specs

use crate::prelude::*;

#[test]
fn help_lists_subcommands() {
    Project::empty()
        .leveld()
        .args(["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("check");
}

#[test]
fn version_is_printed() {
    Project::empty()
        .leveld()
        .args(["--version"])
        .passes()
        .stdout_has("leveld");
}

#[test]
fn missing_subcommand_fails() {
    Project::empty().leveld().fails().stderr_has("Usage");
}

#[test]
fn unknown_subcommand_fails() {
    Project::empty()
        .leveld()
        .args(["scale"])
        .fails()
        .stderr_has("scale");
}
