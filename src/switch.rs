//! State reconciler: apply a profile's fields to the live git/gh state.
//!
//! Fields are applied in a fixed order and each step runs only if every
//! step before it succeeded. Git config keys are independently meaningful,
//! so earlier writes are allowed to stand when a later step fails; the
//! error names the failed step. Auth activation is all-or-nothing: it either
//! completes through `gh auth switch` or is not attempted.

use crate::gh::AuthBackend;
use crate::git::GitBackend;
use crate::store::expand_home;
use crate::store::profiles::Profile;
use crate::{Error, Result};
use std::path::Path;

/// What a switch actually did.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SwitchReport {
    /// The activated identity.
    pub username: String,
    /// Git config keys written, in application order.
    pub applied: Vec<String>,
    /// Whether `gh auth switch` ran successfully.
    pub auth_switched: bool,
    /// Set when auth activation was skipped (e.g. gh not installed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_warning: Option<String>,
}

/// Build the `core.sshCommand` value pinning git to one key.
///
/// `IdentitiesOnly` stops the agent from offering other identities, which is
/// the whole point of pinning.
pub fn ssh_command_for(key_path: &Path) -> String {
    format!(
        "ssh -i {} -o IdentitiesOnly=yes",
        expand_home(key_path).display()
    )
}

/// Apply `profile` to the external git configuration and activate its auth
/// session. Idempotent: re-applying the active identity re-writes the same
/// values and succeeds.
pub fn apply_profile(
    profile: &Profile,
    git: &impl GitBackend,
    auth: &impl AuthBackend,
) -> Result<SwitchReport> {
    let mut applied = Vec::new();

    let mut set = |key: &str, value: &str| -> Result<()> {
        git.set_global(key, value)
            .map_err(|e| Error::Other(format!("switch stopped at {}: {}", key, e)))?;
        applied.push(key.to_string());
        Ok(())
    };

    // Identity fields first; name falls back to the username so a bare
    // profile still produces a usable git identity.
    let name = profile.name.as_deref().unwrap_or(&profile.username);
    set("user.name", name)?;
    if let Some(email) = &profile.email {
        set("user.email", email)?;
    }

    // Signing configuration, only when the profile carries any.
    if let Some(signing_key) = &profile.signing_key {
        set("user.signingkey", signing_key)?;
    }
    if profile.signing_key.is_some() || profile.auto_sign {
        set(
            "commit.gpgsign",
            if profile.auto_sign { "true" } else { "false" },
        )?;
    }

    // SSH key pinning.
    if let Some(key_path) = &profile.ssh_key_path {
        set("core.sshCommand", &ssh_command_for(Path::new(key_path)))?;
    }

    // Auth activation last: everything before it succeeded, and it either
    // completes or the command fails with the exact reason.
    let (auth_switched, auth_warning) = if auth.is_available() {
        auth.switch_user(&profile.host, &profile.username)?;
        (true, None)
    } else {
        (
            false,
            Some(format!(
                "gh is not installed; auth for {} was not switched (install gh and run `gh auth login --hostname {}`)",
                profile.username, profile.host
            )),
        )
    };

    Ok(SwitchReport {
        username: profile.username.clone(),
        applied,
        auth_switched,
        auth_warning,
    })
}
