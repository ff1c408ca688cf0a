//! Command implementations for the gh-switcher CLI.
//!
//! This module contains the business logic for each CLI command, organized
//! by subject:
//! - `profile` - identity CRUD (`add`, `remove`, `edit`, `list`, `show`, `status`)
//! - `assign` - directory assignments
//! - `switch` - applying an identity to live git/gh state
//! - `guard` - pre-commit hook management and validation
//! - `ssh` - the `test-ssh` probe
//!
//! Every command returns a typed result struct implementing [`Output`], so
//! `main` can render it as JSON (default) or human-readable text.

pub mod assign;
pub mod guard;
pub mod profile;
pub mod ssh;
pub mod switch;

use crate::Result;
use crate::git::GitBackend;
use crate::store::profiles::{Profile, ProfileStore};
use serde::Serialize;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to a JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Serialize any result struct; serialization of our own types cannot fail
/// in practice, but an error must never panic a command that already
/// succeeded.
pub(crate) fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {}"}}"#, e))
}

/// The profile matching the live git identity, if any.
///
/// "Currently active" is defined by observation, not by a state file: the
/// first profile whose expected `user.name` matches the effective git
/// config (and whose email matches, when the profile has one) is current.
pub(crate) fn current_profile<'a>(
    profiles: &'a ProfileStore,
    git: &impl GitBackend,
) -> Result<Option<&'a Profile>> {
    let actual = git.read_identity()?;
    Ok(profiles.list().iter().find(|p| {
        let expected_name = p.name.as_deref().unwrap_or(&p.username);
        actual.name.as_deref() == Some(expected_name)
            && (p.email.is_none() || actual.email == p.email)
    }))
}
