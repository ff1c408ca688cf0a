//! Typed interface to the external `git` CLI.
//!
//! The reconciler and the guard never parse raw git output themselves; they
//! go through [`GitBackend`], so the logic stays pure and testable against
//! in-memory fakes. The real implementation shells out to `git` and surfaces
//! stderr in errors.

use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The identity-relevant slice of effective git configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitIdentity {
    /// `user.name`, if set.
    pub name: Option<String>,
    /// `user.email`, if set.
    pub email: Option<String>,
    /// `user.signingkey`, if set.
    pub signing_key: Option<String>,
    /// `commit.gpgsign`, if set.
    pub gpg_sign: Option<bool>,
}

/// Seam between identity logic and the git CLI.
pub trait GitBackend {
    /// Read the effective identity configuration (local overrides global).
    fn read_identity(&self) -> Result<GitIdentity>;

    /// Write a key into global git configuration.
    fn set_global(&self, key: &str, value: &str) -> Result<()>;
}

/// Real backend invoking the `git` binary.
///
/// Reads are scoped to `cwd` when set, so repository-local configuration is
/// honored; writes always target `--global` (an identity is a per-user
/// concern).
pub struct GitCli {
    cwd: Option<PathBuf>,
}

impl GitCli {
    /// Backend reading effective config as seen from `cwd`.
    pub fn for_dir(cwd: &Path) -> Self {
        Self {
            cwd: Some(cwd.to_path_buf()),
        }
    }

    /// Backend reading only global scope (no repository context).
    pub fn global() -> Self {
        Self { cwd: None }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        if let Some(cwd) = &self.cwd {
            cmd.arg("-C").arg(cwd);
        }
        cmd
    }

    /// `git config --get <key>`; exit code 1 means unset.
    fn get_config(&self, key: &str) -> Result<Option<String>> {
        let output = self
            .command()
            .args(["config", "--get", key])
            .output()
            .map_err(|e| Error::GitCommand(format!("failed to run git: {}", e)))?;

        if output.status.success() {
            let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok(if value.is_empty() { None } else { Some(value) })
        } else if output.status.code() == Some(1) {
            Ok(None)
        } else {
            Err(Error::GitCommand(format!(
                "git config --get {}: {}",
                key,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

impl GitBackend for GitCli {
    fn read_identity(&self) -> Result<GitIdentity> {
        let gpg_sign = self
            .get_config("commit.gpgsign")?
            .map(|v| matches!(v.as_str(), "true" | "1" | "yes" | "on"));

        Ok(GitIdentity {
            name: self.get_config("user.name")?,
            email: self.get_config("user.email")?,
            signing_key: self.get_config("user.signingkey")?,
            gpg_sign,
        })
    }

    fn set_global(&self, key: &str, value: &str) -> Result<()> {
        let output = self
            .command()
            .args(["config", "--global", key, value])
            .output()
            .map_err(|e| Error::GitCommand(format!("failed to run git: {}", e)))?;

        if !output.status.success() {
            return Err(Error::GitCommand(format!(
                "git config --global {}: {}",
                key,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Walk upward from `start` looking for a `.git` entry (directory, or the
/// gitfile a worktree leaves behind).
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

/// Resolve the hooks directory for a repository root.
///
/// Handles both a real `.git` directory and a worktree-style `.git` file
/// containing a `gitdir:` pointer.
pub fn hooks_dir(repo_root: &Path) -> Result<PathBuf> {
    let dot_git = repo_root.join(".git");

    if dot_git.is_dir() {
        return Ok(dot_git.join("hooks"));
    }

    if dot_git.is_file() {
        let content = fs::read_to_string(&dot_git)?;
        if let Some(gitdir) = content.trim().strip_prefix("gitdir:") {
            let gitdir = gitdir.trim();
            let gitdir_path = PathBuf::from(gitdir);
            let resolved = if gitdir_path.is_absolute() {
                gitdir_path
            } else {
                repo_root.join(gitdir_path)
            };
            return Ok(resolved.join("hooks"));
        }
    }

    Err(Error::NotAGitRepo(repo_root.display().to_string()))
}
