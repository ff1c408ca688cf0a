//! Guard hook commands: install, uninstall, status, test.

use crate::commands::profile::guard_summary;
use crate::commands::{Output, json};
use crate::gh::AuthBackend;
use crate::git::{GitBackend, find_git_root};
use crate::guard::{
    GuardOutcome, HookStatus, InstallReport, UninstallReport, check, hook_status, install_hook,
    uninstall_hook,
};
use crate::store::assignments::AssignmentStore;
use crate::store::profiles::ProfileStore;
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

fn repo_root(cwd: &Path) -> Result<PathBuf> {
    find_git_root(cwd).ok_or_else(|| Error::NotAGitRepo(cwd.display().to_string()))
}

/// Result of `ghs guard install`.
#[derive(Debug, Serialize)]
pub struct GuardInstallResult {
    #[serde(flatten)]
    pub report: InstallReport,
}

impl Output for GuardInstallResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("Installed guard hook at {}", self.report.path.display());
        if self.report.replaced_foreign {
            out.push_str("\nPrevious hook backed up next to it; `ghs guard uninstall` restores it");
        }
        out
    }
}

/// Install the pre-commit guard hook into the enclosing repository.
pub fn install(cwd: &Path, force: bool) -> Result<GuardInstallResult> {
    let root = repo_root(cwd)?;
    let report = install_hook(&root, force)?;
    Ok(GuardInstallResult { report })
}

/// Result of `ghs guard uninstall`.
#[derive(Debug, Serialize)]
pub struct GuardUninstallResult {
    #[serde(flatten)]
    pub report: UninstallReport,
}

impl Output for GuardUninstallResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match (self.report.removed, self.report.restored_backup) {
            (false, _) => "No guard hook was installed.".to_string(),
            (true, false) => "Removed guard hook.".to_string(),
            (true, true) => "Removed guard hook and restored the previous hook.".to_string(),
        }
    }
}

/// Remove the guard hook from the enclosing repository.
pub fn uninstall(cwd: &Path) -> Result<GuardUninstallResult> {
    let root = repo_root(cwd)?;
    let report = uninstall_hook(&root)?;
    Ok(GuardUninstallResult { report })
}

/// Result of `ghs guard status`.
#[derive(Debug, Serialize)]
pub struct GuardStatusResult {
    pub repository: PathBuf,
    pub status: HookStatus,
}

impl Output for GuardStatusResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let state = match self.status {
            HookStatus::Installed => "installed",
            HookStatus::NotInstalled => "not installed (run `ghs guard install`)",
            HookStatus::Foreign => {
                "a pre-commit hook from another tool is present (use `ghs guard install --force` to replace it)"
            }
        };
        format!("Guard hook in {}: {}", self.repository.display(), state)
    }
}

/// Report the hook installation state for the enclosing repository.
pub fn status(cwd: &Path) -> Result<GuardStatusResult> {
    let root = repo_root(cwd)?;
    let status = hook_status(&root)?;
    Ok(GuardStatusResult {
        repository: root,
        status,
    })
}

/// Result of `ghs guard test`.
#[derive(Debug, Serialize)]
pub struct GuardTestResult {
    #[serde(flatten)]
    pub outcome: GuardOutcome,
}

impl GuardTestResult {
    /// Exit code contract for the hook: only a mismatch blocks the commit.
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            GuardOutcome::Mismatched { .. } => 1,
            GuardOutcome::Matched { .. } | GuardOutcome::Unassigned { .. } => 0,
        }
    }

    /// Matched is silent success in human mode; the hook should not add
    /// noise to every commit.
    pub fn is_silent(&self) -> bool {
        matches!(self.outcome, GuardOutcome::Matched { .. })
    }
}

impl Output for GuardTestResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        guard_summary(&self.outcome)
    }
}

/// Run the guard validation once for `cwd`.
pub fn test(
    config_dir: &Path,
    cwd: &Path,
    git: &impl GitBackend,
    auth: &impl AuthBackend,
) -> Result<GuardTestResult> {
    let profiles = ProfileStore::load(config_dir)?;
    let assignments = AssignmentStore::load(config_dir)?;
    let outcome = check(cwd, &profiles, &assignments, git, auth)?;
    Ok(GuardTestResult { outcome })
}
