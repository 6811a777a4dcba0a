//! Shared helpers for the leveld specs

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const MINIMAL_CONFIG: &str = r#"
requeue_after = "10s"
namespace = "arena"

[template]
image = "busybox:1.36"
"#;

/// Scratch directory holding config files for one test
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `rel`, creating parent directories
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn leveld(&self) -> CliBuilder {
        CliBuilder::new(self.path())
    }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    fn new(cwd: &Path) -> Self {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_leveld"));
        cmd.current_dir(cwd).env_remove("RUST_LOG");
        Self { cmd }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> RunAssert {
        RunAssert(self.cmd.assert().success())
    }

    pub fn fails(mut self) -> RunAssert {
        RunAssert(self.cmd.assert().failure())
    }
}

pub struct RunAssert(assert_cmd::assert::Assert);

impl RunAssert {
    pub fn stdout_has(self, expected: &str) -> Self {
        Self(self.0.stdout(predicate::str::contains(expected)))
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        Self(self.0.stdout(predicate::str::contains(unexpected).not()))
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        Self(self.0.stderr(predicate::str::contains(expected)))
    }
}
