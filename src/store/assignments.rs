//! Directory-to-identity assignment store.
//!
//! Each assignment binds one normalized absolute directory to a username.
//! The store does not validate usernames against the profile store; the two
//! stores are decoupled and the CLI validates at write time. Assignments
//! whose identity has since been removed are swept only by [`AssignmentStore::clean`].

use crate::store::{ASSIGNMENTS_FILE, atomic_write, normalize_dir, read_jsonl};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A directory-to-identity binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Absolute normalized directory, no trailing slash.
    pub directory: PathBuf,
    /// Identity expected in this directory and its descendants.
    pub username: String,
}

/// Ordered store of assignments, persisted as JSONL.
pub struct AssignmentStore {
    path: PathBuf,
    entries: Vec<Assignment>,
}

impl AssignmentStore {
    /// Load the assignment store from the given config directory.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(ASSIGNMENTS_FILE);
        let mut entries = Vec::new();
        for line in read_jsonl(&path)? {
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(Self { path, entries })
    }

    /// Bind a directory to a username. Re-assigning an already-bound
    /// directory overwrites in place (last write wins).
    pub fn assign(&mut self, directory: &Path, username: &str) -> Result<Assignment> {
        let directory = normalize_dir(directory)?;

        let entry = Assignment {
            directory: directory.clone(),
            username: username.to_string(),
        };

        match self.entries.iter_mut().find(|a| a.directory == directory) {
            Some(existing) => *existing = entry.clone(),
            None => self.entries.push(entry.clone()),
        }

        self.persist()?;
        Ok(entry)
    }

    /// Remove the assignment at exactly this directory.
    pub fn unassign(&mut self, directory: &Path) -> Result<Assignment> {
        let directory = normalize_dir(directory)?;
        let pos = self
            .entries
            .iter()
            .position(|a| a.directory == directory)
            .ok_or_else(|| Error::AssignmentNotFound(directory.display().to_string()))?;
        let removed = self.entries.remove(pos);
        self.persist()?;
        Ok(removed)
    }

    /// Exact-match lookup (no ancestor walk; see [`crate::resolver`]).
    pub fn get(&self, directory: &Path) -> Option<&Assignment> {
        self.entries.iter().find(|a| a.directory == directory)
    }

    /// All assignments, in insertion order.
    pub fn list(&self) -> &[Assignment] {
        &self.entries
    }

    /// Directories currently assigned to the given username.
    pub fn directories_for(&self, username: &str) -> Vec<&Path> {
        self.entries
            .iter()
            .filter(|a| a.username == username)
            .map(|a| a.directory.as_path())
            .collect()
    }

    /// Sweep stale assignments: identity no longer exists, or the directory
    /// is gone from disk. Returns the removed entries.
    pub fn clean(
        &mut self,
        existing_usernames: &HashSet<String>,
        dir_exists: impl Fn(&Path) -> bool,
    ) -> Result<Vec<Assignment>> {
        let (keep, removed): (Vec<_>, Vec<_>) = self
            .entries
            .drain(..)
            .partition(|a| existing_usernames.contains(&a.username) && dir_exists(&a.directory));

        self.entries = keep;
        if !removed.is_empty() {
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        let lines = self
            .entries
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        atomic_write(&self.path, &lines)
    }
}
