//! The `ghs switch` command.

use crate::commands::{Output, json};
use crate::gh::AuthBackend;
use crate::git::GitBackend;
use crate::store::profiles::ProfileStore;
use crate::switch::{SwitchReport, apply_profile};
use crate::Result;
use serde::Serialize;
use std::path::Path;

/// Result of `ghs switch`.
#[derive(Debug, Serialize)]
pub struct SwitchResult {
    #[serde(flatten)]
    pub report: SwitchReport,
}

impl Output for SwitchResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let r = &self.report;
        let mut out = format!("Switched to {}", r.username);
        if !r.applied.is_empty() {
            out.push_str(&format!(" ({})", r.applied.join(", ")));
        }
        if r.auth_switched {
            out.push_str("\ngh auth session activated");
        }
        if let Some(warning) = &r.auth_warning {
            out.push_str(&format!("\nWarning: {}", warning));
        }
        out
    }
}

/// Switch the live git/gh state to an identity and record the use.
pub fn switch(
    config_dir: &Path,
    selector: &str,
    git: &impl GitBackend,
    auth: &impl AuthBackend,
) -> Result<SwitchResult> {
    let mut store = ProfileStore::load(config_dir)?;
    let profile = store.get_by_selector(selector)?.clone();

    let report = apply_profile(&profile, git, auth)?;

    // last_used is bookkeeping; it only moves once the switch fully landed.
    store.touch(&profile.username)?;

    Ok(SwitchResult { report })
}
