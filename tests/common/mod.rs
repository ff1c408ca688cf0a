//! Common test utilities for gh-switcher integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute the
//! user's `~/.config/gh-switcher/` or `~/.gitconfig`.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::Path;
pub use tempfile::TempDir;

/// A test environment with isolated configuration and git state.
///
/// Each `TestEnv` creates three temporary directories:
/// - `repo_dir`: acts as the working directory (usually a git repo)
/// - `config_dir`: holds gh-switcher's stores (via `GHS_CONFIG_DIR`)
/// - `home_dir`: fake `$HOME`, so `git config --global` writes land in a
///   throwaway `.gitconfig`
///
/// The `ghs()` method returns a `Command` with all three wired up
/// per-invocation, making tests parallel-safe. A fake `gh` (and optionally a
/// constrained `PATH`) can be injected with `fake_gh()`.
pub struct TestEnv {
    pub repo_dir: TempDir,
    pub config_dir: TempDir,
    pub home_dir: TempDir,
    bin_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            repo_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
            home_dir: TempDir::new().unwrap(),
            bin_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the ghs binary with isolated config and home.
    pub fn ghs(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ghs"));
        cmd.current_dir(self.repo_dir.path());
        cmd.env("GHS_CONFIG_DIR", self.config_dir.path());
        cmd.env("HOME", self.home_dir.path());
        // Shadow the real gh (if any) with the fake bin dir.
        let path = std::env::var("PATH").unwrap_or_default();
        cmd.env("PATH", format!("{}:{}", self.bin_dir.path().display(), path));
        cmd
    }

    /// Install a fake `gh` script ahead of the real one on PATH.
    ///
    /// The script body receives the gh arguments as `$@`.
    pub fn fake_gh(&self, body: &str) {
        let path = self.bin_dir.path().join("gh");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        make_executable(&path);
    }

    /// Fake gh reporting `user` as the single active account on github.com,
    /// and accepting any `auth switch`.
    pub fn fake_gh_active(&self, user: &str) {
        self.fake_gh(&format!(
            r#"case "$1 $2" in
"auth status")
    echo "github.com"
    echo "  Logged in to github.com account {user} (keyring)"
    echo "  - Active account: true"
    ;;
"auth switch")
    exit 0
    ;;
"--version ")
    echo "gh version 2.40.0 (fake)"
    ;;
*)
    exit 0
    ;;
esac"#
        ));
    }

    /// Fake gh that refuses to switch accounts.
    pub fn fake_gh_refusing(&self, reason: &str) {
        self.fake_gh(&format!(
            r#"case "$1 $2" in
"auth switch")
    echo "{reason}" >&2
    exit 1
    ;;
"--version ")
    echo "gh version 2.40.0 (fake)"
    ;;
*)
    exit 0
    ;;
esac"#
        ));
    }

    /// Initialize a git repository in the repo dir.
    pub fn init_git(&self) {
        run_git(self.repo_path(), &["init", "--quiet"]);
    }

    /// Set a repository-local git config key.
    pub fn git_config_local(&self, key: &str, value: &str) {
        run_git(self.repo_path(), &["config", key, value]);
    }

    /// Read a global git config key from the isolated home, if set.
    pub fn git_config_global(&self, key: &str) -> Option<String> {
        let output = std::process::Command::new("git")
            .args(["config", "--global", "--get", key])
            .env("HOME", self.home_dir.path())
            .output()
            .expect("failed to run git");
        if output.status.success() {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            None
        }
    }

    pub fn repo_path(&self) -> &Path {
        self.repo_dir.path()
    }

    pub fn config_path(&self) -> &Path {
        self.config_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a git command in `dir`, asserting success.
pub fn run_git(dir: &Path, args: &[&str]) {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
