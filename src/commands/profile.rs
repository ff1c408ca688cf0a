//! Identity profile commands: add, remove, edit, list, show, status.

use crate::commands::{Output, current_profile, json};
use crate::gh::AuthBackend;
use crate::git::GitBackend;
use crate::guard::{ActualAuth, GuardOutcome, classify};
use crate::resolver::resolve;
use crate::ssh::ProbeOutcome;
use crate::store::assignments::AssignmentStore;
use crate::store::profiles::{Profile, ProfileField, ProfileStore};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Arguments for `ghs add`.
pub struct AddArgs {
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub ssh_key: Option<String>,
    pub signing_key: Option<String>,
    pub host: Option<String>,
    pub auto_sign: bool,
}

/// Result of `ghs add`.
#[derive(Debug, Serialize)]
pub struct AddResult {
    pub username: String,
    pub index: usize,
    /// Non-fatal warning from the SSH probe (host unreachable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Output for AddResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("Added identity {} (index {})", self.username, self.index);
        if let Some(warning) = &self.warning {
            out.push_str(&format!("\nWarning: {}", warning));
        }
        out
    }
}

/// Add a new identity profile.
///
/// When the profile carries an SSH key, the key is probed against the
/// profile's host. An unreachable host is a warning (the check can be
/// re-run later with `ghs test-ssh`); a rejected key is an error.
pub fn add(
    config_dir: &Path,
    args: AddArgs,
    default_host: &str,
    prober: impl Fn(&Path, &str) -> Result<ProbeOutcome>,
) -> Result<AddResult> {
    let mut profile = Profile::new(args.username);
    profile.name = args.name;
    profile.email = args.email;
    profile.signing_key = args.signing_key;
    profile.ssh_key_path = args.ssh_key;
    profile.host = args.host.unwrap_or_else(|| default_host.to_string());
    profile.auto_sign = args.auto_sign;

    let warning = match &profile.ssh_key_path {
        Some(key) => match prober(Path::new(key), &profile.host)? {
            ProbeOutcome::Ok { .. } => None,
            ProbeOutcome::AuthRejected => {
                return Err(Error::SshAuthRejected {
                    host: profile.host.clone(),
                });
            }
            ProbeOutcome::Unreachable { reason } => Some(format!(
                "could not verify SSH key against {} ({}); run `ghs test-ssh {}` once the network is back",
                profile.host, reason, profile.username
            )),
        },
        None => None,
    };

    let username = profile.username.clone();
    let mut store = ProfileStore::load(config_dir)?;
    let index = store.add(profile)?;

    Ok(AddResult {
        username,
        index,
        warning,
    })
}

/// Result of `ghs remove`.
#[derive(Debug, Serialize)]
pub struct RemoveResult {
    pub username: String,
    /// Directories still assigned to the removed identity. Left in place
    /// until `ghs assign --clean`.
    pub dangling_assignments: Vec<PathBuf>,
}

impl Output for RemoveResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("Removed identity {}", self.username);
        if !self.dangling_assignments.is_empty() {
            out.push_str(&format!(
                "\n{} assignment(s) now dangling; run `ghs assign --clean` to sweep them:",
                self.dangling_assignments.len()
            ));
            for dir in &self.dangling_assignments {
                out.push_str(&format!("\n  {}", dir.display()));
            }
        }
        out
    }
}

/// Remove an identity profile. Assignments are deliberately not cascaded.
pub fn remove(config_dir: &Path, selector: &str) -> Result<RemoveResult> {
    let mut store = ProfileStore::load(config_dir)?;
    let username = store.get_by_selector(selector)?.username.clone();
    store.remove(&username)?;

    let assignments = AssignmentStore::load(config_dir)?;
    let dangling_assignments = assignments
        .directories_for(&username)
        .into_iter()
        .map(Path::to_path_buf)
        .collect();

    Ok(RemoveResult {
        username,
        dangling_assignments,
    })
}

/// Result of `ghs edit`.
#[derive(Debug, Serialize)]
pub struct EditResult {
    pub username: String,
    pub field: String,
    pub value: String,
}

impl Output for EditResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.value.is_empty() {
            format!("Cleared {} on {}", self.field, self.username)
        } else {
            format!("Set {} = {} on {}", self.field, self.value, self.username)
        }
    }
}

/// Edit one field of an identity profile.
pub fn edit(config_dir: &Path, selector: &str, field: &str, value: &str) -> Result<EditResult> {
    let parsed = ProfileField::parse(field)?;
    let mut store = ProfileStore::load(config_dir)?;
    let username = store.get_by_selector(selector)?.username.clone();
    store.update(&username, parsed, value)?;

    Ok(EditResult {
        username,
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// One row of `ghs list`.
#[derive(Debug, Serialize)]
pub struct ListEntry {
    pub index: usize,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
    /// Matches the live git identity right now.
    pub current: bool,
    /// Directories assigned to this identity.
    pub directories: Vec<PathBuf>,
}

/// Result of `ghs list`.
#[derive(Debug, Serialize)]
pub struct ListResult {
    pub identities: Vec<ListEntry>,
}

impl Output for ListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.identities.is_empty() {
            return "No identities configured. Add one with `ghs add <username>`.".to_string();
        }

        let mut out = String::new();
        for entry in &self.identities {
            let marker = if entry.current { "*" } else { " " };
            out.push_str(&format!(
                "{} {}. {} <{}> on {}\n",
                marker,
                entry.index,
                entry.username,
                entry.email.as_deref().unwrap_or("no email"),
                entry.host
            ));
            for dir in &entry.directories {
                out.push_str(&format!("      -> {}\n", dir.display()));
            }
        }
        out.trim_end().to_string()
    }
}

/// List all identities, marking the currently active one.
pub fn list(config_dir: &Path, git: &impl GitBackend) -> Result<ListResult> {
    let store = ProfileStore::load(config_dir)?;
    let assignments = AssignmentStore::load(config_dir)?;
    let current = current_profile(&store, git)?.map(|p| p.username.clone());

    let identities = store
        .list()
        .iter()
        .enumerate()
        .map(|(i, p)| ListEntry {
            index: i + 1,
            username: p.username.clone(),
            name: p.name.clone(),
            email: p.email.clone(),
            host: p.host.clone(),
            last_used: p.last_used,
            current: current.as_deref() == Some(p.username.as_str()),
            directories: assignments
                .directories_for(&p.username)
                .into_iter()
                .map(Path::to_path_buf)
                .collect(),
        })
        .collect();

    Ok(ListResult { identities })
}

/// Result of `ghs show`.
#[derive(Debug, Serialize)]
pub struct ShowResult {
    #[serde(flatten)]
    pub profile: Profile,
    pub index: usize,
    pub current: bool,
}

impl Output for ShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let p = &self.profile;
        let mut out = format!(
            "{}{} (index {})\n  host: {}",
            p.username,
            if self.current { " [current]" } else { "" },
            self.index,
            p.host
        );
        if let Some(name) = &p.name {
            out.push_str(&format!("\n  name: {}", name));
        }
        if let Some(email) = &p.email {
            out.push_str(&format!("\n  email: {}", email));
        }
        if let Some(key) = &p.ssh_key_path {
            out.push_str(&format!("\n  ssh key: {}", key));
        }
        if let Some(key) = &p.signing_key {
            out.push_str(&format!(
                "\n  signing key: {} (auto-sign {})",
                key,
                if p.auto_sign { "on" } else { "off" }
            ));
        }
        if let Some(last_used) = &p.last_used {
            out.push_str(&format!("\n  last used: {}", last_used.to_rfc3339()));
        }
        out
    }
}

/// Show one profile; with no selector, the currently active identity.
pub fn show(config_dir: &Path, selector: Option<&str>, git: &impl GitBackend) -> Result<ShowResult> {
    let store = ProfileStore::load(config_dir)?;

    let profile = match selector {
        Some(sel) => store.get_by_selector(sel)?.clone(),
        None => current_profile(&store, git)?
            .ok_or_else(|| {
                Error::Other(
                    "no identity is currently active (git config matches no profile); pass a username or run `ghs switch <user>`"
                        .to_string(),
                )
            })?
            .clone(),
    };

    let index = store.index_of(&profile.username).unwrap_or(0);
    let current = current_profile(&store, git)?
        .map(|p| p.username == profile.username)
        .unwrap_or(false);

    Ok(ShowResult {
        profile,
        index,
        current,
    })
}

/// Result of `ghs status`.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    pub directory: PathBuf,
    /// Identity expected here, with the assignment directory it came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<ExpectedIdentity>,
    /// Effective git user.name in this directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_name: Option<String>,
    /// Effective git user.email in this directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_email: Option<String>,
    /// Active gh account for the expected host, when gh is installed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_user: Option<String>,
    pub guard: GuardOutcome,
}

#[derive(Debug, Serialize)]
pub struct ExpectedIdentity {
    pub username: String,
    pub assigned_at: PathBuf,
}

impl Output for StatusResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("Directory: {}", self.directory.display());
        match &self.expected {
            Some(expected) => out.push_str(&format!(
                "\nExpected identity: {} (assigned at {})",
                expected.username,
                expected.assigned_at.display()
            )),
            None => out.push_str("\nExpected identity: none (unassigned)"),
        }
        out.push_str(&format!(
            "\nGit identity: {} <{}>",
            self.git_name.as_deref().unwrap_or("unset"),
            self.git_email.as_deref().unwrap_or("unset")
        ));
        if let Some(auth_user) = &self.auth_user {
            out.push_str(&format!("\nActive gh account: {}", auth_user));
        }
        out.push('\n');
        out.push_str(&guard_summary(&self.guard));
        out
    }
}

/// Shared human rendering for a guard outcome.
pub(crate) fn guard_summary(outcome: &GuardOutcome) -> String {
    match outcome {
        GuardOutcome::Matched { username } => format!("Identity check: matched ({})", username),
        GuardOutcome::Mismatched { username, mismatches } => {
            let mut out = format!(
                "Identity check: MISMATCHED (expected {}); run `ghs switch {}` to fix:",
                username, username
            );
            for m in mismatches {
                out.push_str(&format!(
                    "\n  {}: expected {}, found {}",
                    m.field,
                    m.expected,
                    m.actual.as_deref().unwrap_or("nothing")
                ));
            }
            out
        }
        GuardOutcome::Unassigned { dangling } => match dangling {
            Some(username) => format!(
                "Identity check: unassigned (assignment points at removed identity {}; run `ghs assign --clean`)",
                username
            ),
            None => "Identity check: unassigned (bind one with `ghs assign <user>`)".to_string(),
        },
    }
}

/// Report the expected vs. actual identity for `cwd`.
pub fn status(
    config_dir: &Path,
    cwd: &Path,
    git: &impl GitBackend,
    auth: &impl AuthBackend,
) -> Result<StatusResult> {
    let profiles = ProfileStore::load(config_dir)?;
    let assignments = AssignmentStore::load(config_dir)?;

    let resolved = resolve(cwd, &assignments)?;
    let actual = git.read_identity()?;

    let expected = resolved.as_ref().map(|a| ExpectedIdentity {
        username: a.username.clone(),
        assigned_at: a.directory.clone(),
    });

    let expected_username = resolved.map(|a| a.username);
    let profile = expected_username
        .as_deref()
        .and_then(|u| profiles.get(u).ok());

    // The guard outcome mirrors what a commit in this directory would see.
    let (guard, auth_user) = match profile {
        Some(profile) => {
            let actual_auth = if auth.is_available() {
                ActualAuth::Active(auth.active_user(&profile.host)?)
            } else {
                ActualAuth::Unavailable
            };
            let auth_user = match &actual_auth {
                ActualAuth::Active(user) => user.clone(),
                ActualAuth::Unavailable => None,
            };
            (classify(profile, &actual, &actual_auth), auth_user)
        }
        None => (
            GuardOutcome::Unassigned {
                dangling: expected_username,
            },
            None,
        ),
    };

    Ok(StatusResult {
        directory: cwd.to_path_buf(),
        expected,
        git_name: actual.name,
        git_email: actual.email,
        auth_user,
        guard,
    })
}
