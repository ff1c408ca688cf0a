//! Directory assignment commands.

use crate::commands::{Output, current_profile, json};
use crate::git::GitBackend;
use crate::store::assignments::{Assignment, AssignmentStore};
use crate::store::profiles::ProfileStore;
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of `ghs assign <dir> <user>`.
#[derive(Debug, Serialize)]
pub struct AssignResult {
    pub directory: PathBuf,
    pub username: String,
    /// Username this directory pointed at before, when overwriting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced: Option<String>,
}

impl Output for AssignResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match &self.replaced {
            Some(old) => format!(
                "Assigned {} -> {} (was {})",
                self.directory.display(),
                self.username,
                old
            ),
            None => format!("Assigned {} -> {}", self.directory.display(), self.username),
        }
    }
}

/// Interpret the free-form positionals of `ghs assign`.
///
/// `(dir, user)` in either order: a positional that names a known profile
/// (or a valid index) is the user; anything else is a directory. With both
/// missing, the directory defaults to `cwd` and the user to the currently
/// active identity.
pub fn interpret_args(
    args: &[String],
    cwd: &Path,
    profiles: &ProfileStore,
    git: &impl GitBackend,
) -> Result<(PathBuf, String)> {
    let is_user = |s: &str| profiles.get_by_selector(s).is_ok();

    let (dir, user) = match args {
        [] => (None, None),
        [one] => {
            if is_user(one) {
                (None, Some(one.clone()))
            } else {
                (Some(PathBuf::from(one)), None)
            }
        }
        [first, second] => {
            if is_user(second) {
                (Some(PathBuf::from(first)), Some(second.clone()))
            } else if is_user(first) {
                (Some(PathBuf::from(second)), Some(first.clone()))
            } else {
                return Err(Error::NotFound(format!(
                    "neither {} nor {} names a known identity",
                    first, second
                )));
            }
        }
        more => {
            return Err(Error::Other(format!(
                "assign takes at most a directory and a user, got {} arguments",
                more.len()
            )));
        }
    };

    let dir = dir.unwrap_or_else(|| cwd.to_path_buf());
    let user = match user {
        Some(selector) => profiles.get_by_selector(&selector)?.username.clone(),
        None => current_profile(profiles, git)?
            .ok_or_else(|| {
                Error::Other(
                    "no identity is currently active; name one explicitly: `ghs assign <dir> <user>`"
                        .to_string(),
                )
            })?
            .username
            .clone(),
    };

    Ok((dir, user))
}

/// Bind a directory to an identity.
pub fn assign(
    config_dir: &Path,
    args: &[String],
    cwd: &Path,
    git: &impl GitBackend,
) -> Result<AssignResult> {
    let profiles = ProfileStore::load(config_dir)?;
    let (dir, username) = interpret_args(args, cwd, &profiles, git)?;

    let mut store = AssignmentStore::load(config_dir)?;
    let normalized = crate::store::normalize_dir(&dir)?;
    let replaced = store
        .get(&normalized)
        .map(|a| a.username.clone())
        .filter(|old| *old != username);
    let entry = store.assign(&dir, &username)?;

    Ok(AssignResult {
        directory: entry.directory,
        username: entry.username,
        replaced,
    })
}

/// Result of `ghs assign --remove`.
#[derive(Debug, Serialize)]
pub struct UnassignResult {
    pub directory: PathBuf,
    pub username: String,
}

impl Output for UnassignResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Removed assignment {} -> {}",
            self.directory.display(),
            self.username
        )
    }
}

/// Remove the assignment at a directory (default: cwd).
pub fn unassign(config_dir: &Path, args: &[String], cwd: &Path) -> Result<UnassignResult> {
    let dir = match args {
        [] => cwd.to_path_buf(),
        [one] => PathBuf::from(one),
        more => {
            return Err(Error::Other(format!(
                "assign --remove takes at most a directory, got {} arguments",
                more.len()
            )));
        }
    };

    let mut store = AssignmentStore::load(config_dir)?;
    let removed = store.unassign(&dir)?;

    Ok(UnassignResult {
        directory: removed.directory,
        username: removed.username,
    })
}

/// Result of `ghs assign --list`.
#[derive(Debug, Serialize)]
pub struct AssignListResult {
    pub assignments: Vec<Assignment>,
}

impl Output for AssignListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.assignments.is_empty() {
            return "No assignments. Bind a directory with `ghs assign <dir> <user>`.".to_string();
        }
        self.assignments
            .iter()
            .map(|a| format!("{} -> {}", a.directory.display(), a.username))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// List all assignments.
pub fn list(config_dir: &Path) -> Result<AssignListResult> {
    let store = AssignmentStore::load(config_dir)?;
    Ok(AssignListResult {
        assignments: store.list().to_vec(),
    })
}

/// Result of `ghs assign --clean`.
#[derive(Debug, Serialize)]
pub struct CleanResult {
    pub removed: Vec<Assignment>,
}

impl Output for CleanResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.removed.is_empty() {
            return "Nothing to clean.".to_string();
        }
        let mut out = format!("Removed {} stale assignment(s):", self.removed.len());
        for a in &self.removed {
            out.push_str(&format!("\n  {} -> {}", a.directory.display(), a.username));
        }
        out
    }
}

/// Sweep assignments whose identity was removed or whose directory is gone.
pub fn clean(config_dir: &Path) -> Result<CleanResult> {
    let profiles = ProfileStore::load(config_dir)?;
    let mut store = AssignmentStore::load(config_dir)?;

    let removed = store.clean(&profiles.usernames(), |dir| dir.exists())?;
    Ok(CleanResult { removed })
}
