//! Identity resolution: map a working directory to its expected identity.
//!
//! Exact assignment match wins; otherwise the nearest assigned ancestor,
//! walking upward to the filesystem root. No match is a valid terminal state
//! ("unassigned"), not an error. The walk is O(depth) and results are never
//! cached across invocations, since directories can be reassigned between
//! commands.

use crate::Result;
use crate::store::assignments::{Assignment, AssignmentStore};
use crate::store::normalize_dir;
use std::path::Path;

/// Resolve the expected identity for `cwd`.
///
/// Returns the matched assignment (which names both the identity and the
/// directory it was matched at), or `None` when neither `cwd` nor any
/// ancestor is assigned.
pub fn resolve(cwd: &Path, assignments: &AssignmentStore) -> Result<Option<Assignment>> {
    let cwd = normalize_dir(cwd)?;

    let mut current: Option<&Path> = Some(cwd.as_path());
    while let Some(dir) = current {
        if let Some(found) = assignments.get(dir) {
            return Ok(Some(found.clone()));
        }
        current = dir.parent();
    }

    Ok(None)
}
