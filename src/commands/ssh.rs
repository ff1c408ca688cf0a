//! The `ghs test-ssh` command.

use crate::commands::{Output, current_profile, json};
use crate::git::GitBackend;
use crate::ssh::ProbeOutcome;
use crate::store::profiles::ProfileStore;
use crate::{Error, Result};
use serde::Serialize;
use std::path::Path;

/// Result of `ghs test-ssh`.
#[derive(Debug, Serialize)]
pub struct TestSshResult {
    pub username: String,
    pub host: String,
    pub key: String,
    pub outcome: ProbeResultKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeResultKind {
    Ok,
    AuthRejected,
    Unreachable,
}

impl TestSshResult {
    /// Exit code contract: 0 ok, 1 auth rejected, 2 unreachable. Scriptable
    /// with `--quiet`.
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            ProbeResultKind::Ok => 0,
            ProbeResultKind::AuthRejected => 1,
            ProbeResultKind::Unreachable => 2,
        }
    }
}

impl Output for TestSshResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match self.outcome {
            ProbeResultKind::Ok => format!(
                "SSH key {} authenticates against {}{}",
                self.key,
                self.host,
                self.detail
                    .as_deref()
                    .map(|u| format!(" as {}", u))
                    .unwrap_or_default()
            ),
            ProbeResultKind::AuthRejected => format!(
                "{} rejected key {}; upload the public key to the {} account",
                self.host, self.key, self.username
            ),
            ProbeResultKind::Unreachable => format!(
                "{} is unreachable ({}); nothing can be said about the key",
                self.host,
                self.detail.as_deref().unwrap_or("no detail")
            ),
        }
    }
}

/// Probe an identity's SSH key against its host.
pub fn test_ssh(
    config_dir: &Path,
    selector: Option<&str>,
    git: &impl GitBackend,
    prober: impl Fn(&Path, &str) -> Result<ProbeOutcome>,
) -> Result<TestSshResult> {
    let store = ProfileStore::load(config_dir)?;
    let profile = match selector {
        Some(sel) => store.get_by_selector(sel)?.clone(),
        None => current_profile(&store, git)?
            .ok_or_else(|| {
                Error::Other(
                    "no identity is currently active; pass one: `ghs test-ssh <user>`".to_string(),
                )
            })?
            .clone(),
    };

    let key = profile.ssh_key_path.clone().ok_or_else(|| {
        Error::Other(format!(
            "identity {} has no SSH key; set one with `ghs edit {} ssh-key <path>`",
            profile.username, profile.username
        ))
    })?;

    let (outcome, detail) = match prober(Path::new(&key), &profile.host)? {
        ProbeOutcome::Ok { user } => (ProbeResultKind::Ok, user),
        ProbeOutcome::AuthRejected => (ProbeResultKind::AuthRejected, None),
        ProbeOutcome::Unreachable { reason } => (ProbeResultKind::Unreachable, Some(reason)),
    };

    Ok(TestSshResult {
        username: profile.username,
        host: profile.host,
        key,
        outcome,
        detail,
    })
}
