//! Identity profile store.
//!
//! Profiles are kept in insertion order; the 1-based position in the list is
//! the numeric shortcut accepted wherever a username is expected (`ghs
//! switch 2`). Removing a profile shifts later positions but never renames
//! anyone.

use crate::store::{PROFILES_FILE, atomic_write, read_jsonl};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default GitHub host for new profiles.
pub const DEFAULT_HOST: &str = "github.com";

/// A single identity: one GitHub account's git/auth/SSH configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique stable identifier (the GitHub login).
    pub username: String,

    /// Display name written to `user.name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Email written to `user.email`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// GPG key id or SSH signing key path for `user.signingkey`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_key: Option<String>,

    /// SSH private key path; stored unexpanded (`~/...` allowed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<String>,

    /// GitHub host the identity authenticates against.
    #[serde(default = "default_host")]
    pub host: String,

    /// When true, switching sets `commit.gpgsign=true`.
    #[serde(default)]
    pub auto_sign: bool,

    /// Updated on every successful switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

impl Profile {
    /// Create a profile with only a username set.
    pub fn new(username: String) -> Self {
        Self {
            username,
            name: None,
            email: None,
            signing_key: None,
            ssh_key_path: None,
            host: default_host(),
            auto_sign: false,
            last_used: None,
        }
    }
}

/// The editable profile fields, as named on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Email,
    SigningKey,
    SshKey,
    Host,
    AutoSign,
}

impl ProfileField {
    /// Parse a CLI field name.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "signing-key" => Ok(Self::SigningKey),
            "ssh-key" => Ok(Self::SshKey),
            "host" => Ok(Self::Host),
            "auto-sign" => Ok(Self::AutoSign),
            other => Err(Error::InvalidField(other.to_string())),
        }
    }
}

/// Validate a username: non-empty, no path separators, no whitespace.
///
/// Usernames become store keys and appear in shell commands, so anything
/// that could change meaning in either context is rejected.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::InvalidUsername("must not be empty".to_string()));
    }
    if username.contains(['/', '\\']) {
        return Err(Error::InvalidUsername(format!(
            "{}: must not contain path separators",
            username
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(Error::InvalidUsername(format!(
            "{}: must not contain whitespace",
            username
        )));
    }
    Ok(())
}

/// Ordered store of identity profiles, persisted as JSONL.
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<Profile>,
}

impl ProfileStore {
    /// Load the profile store from the given config directory.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(PROFILES_FILE);
        let mut profiles = Vec::new();
        for line in read_jsonl(&path)? {
            profiles.push(serde_json::from_str(&line)?);
        }
        Ok(Self { path, profiles })
    }

    /// Append a new profile. Fails if the username is already taken.
    ///
    /// Returns the new profile's 1-based index.
    pub fn add(&mut self, profile: Profile) -> Result<usize> {
        validate_username(&profile.username)?;
        if self.profiles.iter().any(|p| p.username == profile.username) {
            return Err(Error::DuplicateIdentity(profile.username));
        }
        self.profiles.push(profile);
        self.persist()?;
        Ok(self.profiles.len())
    }

    /// Look up a profile by username.
    pub fn get(&self, username: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.username == username)
            .ok_or_else(|| Error::NotFound(username.to_string()))
    }

    /// Resolve a CLI selector: a username, or a 1-based numeric index.
    pub fn get_by_selector(&self, selector: &str) -> Result<&Profile> {
        if let Ok(index) = selector.parse::<usize>() {
            if index >= 1 {
                if let Some(profile) = self.profiles.get(index - 1) {
                    return Ok(profile);
                }
                return Err(Error::NotFound(format!(
                    "index {} (only {} identities configured)",
                    index,
                    self.profiles.len()
                )));
            }
        }
        self.get(selector)
    }

    /// Update one field of an existing profile.
    pub fn update(&mut self, username: &str, field: ProfileField, value: &str) -> Result<()> {
        let profile = self
            .profiles
            .iter_mut()
            .find(|p| p.username == username)
            .ok_or_else(|| Error::NotFound(username.to_string()))?;

        // An empty value clears an optional field.
        let opt = |v: &str| {
            if v.is_empty() {
                None
            } else {
                Some(v.to_string())
            }
        };

        match field {
            ProfileField::Name => profile.name = opt(value),
            ProfileField::Email => profile.email = opt(value),
            ProfileField::SigningKey => profile.signing_key = opt(value),
            ProfileField::SshKey => profile.ssh_key_path = opt(value),
            ProfileField::Host => {
                profile.host = if value.is_empty() {
                    default_host()
                } else {
                    value.to_string()
                }
            }
            ProfileField::AutoSign => {
                profile.auto_sign = match value {
                    "true" | "yes" | "on" | "1" => true,
                    "false" | "no" | "off" | "0" => false,
                    other => {
                        return Err(Error::Other(format!(
                            "auto-sign expects true/false, got {}",
                            other
                        )));
                    }
                }
            }
        }

        self.persist()
    }

    /// Remove a profile by username.
    ///
    /// Dangling assignments are left alone; `ghs assign --clean` sweeps them.
    pub fn remove(&mut self, username: &str) -> Result<Profile> {
        let pos = self
            .profiles
            .iter()
            .position(|p| p.username == username)
            .ok_or_else(|| Error::NotFound(username.to_string()))?;
        let removed = self.profiles.remove(pos);
        self.persist()?;
        Ok(removed)
    }

    /// All profiles, in insertion order.
    pub fn list(&self) -> &[Profile] {
        &self.profiles
    }

    /// 1-based index of a username, if present.
    pub fn index_of(&self, username: &str) -> Option<usize> {
        self.profiles
            .iter()
            .position(|p| p.username == username)
            .map(|i| i + 1)
    }

    /// Record a successful switch to this identity.
    pub fn touch(&mut self, username: &str) -> Result<()> {
        let profile = self
            .profiles
            .iter_mut()
            .find(|p| p.username == username)
            .ok_or_else(|| Error::NotFound(username.to_string()))?;
        profile.last_used = Some(Utc::now());
        self.persist()
    }

    /// The set of usernames currently in the store.
    pub fn usernames(&self) -> std::collections::HashSet<String> {
        self.profiles.iter().map(|p| p.username.clone()).collect()
    }

    fn persist(&self) -> Result<()> {
        let lines = self
            .profiles
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        atomic_write(&self.path, &lines)
    }
}
