//! Typed interface to the external `gh` CLI.
//!
//! Only two capabilities are consumed: which account is currently active for
//! a host (`gh auth status`, a purely local read), and switching the active
//! account (`gh auth switch`). Everything else about `gh` is out of scope.

use crate::{Error, Result};
use std::process::Command;

/// Seam between identity logic and the gh CLI.
pub trait AuthBackend {
    /// Whether the auth tool is installed at all. When it is not, callers
    /// degrade gracefully instead of failing (auth activation is skipped
    /// with a warning; the guard skips the auth comparison).
    fn is_available(&self) -> bool;

    /// The account currently active for `host`, if any.
    fn active_user(&self, host: &str) -> Result<Option<String>>;

    /// Make `user` the active account for `host`.
    fn switch_user(&self, host: &str, user: &str) -> Result<()>;
}

/// Real backend invoking the `gh` binary.
pub struct GhCli;

impl GhCli {
    fn run(args: &[&str]) -> Result<std::process::Output> {
        Command::new("gh")
            .args(args)
            .output()
            .map_err(|e| Error::Other(format!("failed to run gh: {}", e)))
    }
}

impl AuthBackend for GhCli {
    fn is_available(&self) -> bool {
        Command::new("gh")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn active_user(&self, host: &str) -> Result<Option<String>> {
        let output = Self::run(&["auth", "status", "--hostname", host])?;

        // gh has moved auth status between stdout and stderr across
        // versions; parse both. A non-zero exit with parseable output still
        // means "nobody logged in" rather than a hard failure.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(parse_active_user(&text, host))
    }

    fn switch_user(&self, host: &str, user: &str) -> Result<()> {
        let output = Self::run(&["auth", "switch", "--hostname", host, "--user", user])?;

        if !output.status.success() {
            let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::AuthSwitchFailed {
                user: user.to_string(),
                host: host.to_string(),
                reason: if reason.is_empty() {
                    format!("gh exited with {}", output.status)
                } else {
                    reason
                },
            });
        }
        Ok(())
    }
}

/// Extract the active account for `host` from `gh auth status` output.
///
/// The status listing names each account with a "Logged in to <host> account
/// <user>" line, followed by an "Active account: true/false" line. Older gh
/// versions print a single logged-in account with no active marker; that
/// account is taken as active.
pub fn parse_active_user(output: &str, host: &str) -> Option<String> {
    let mut last_seen: Option<String> = None;
    let mut fallback: Option<String> = None;

    for line in output.lines() {
        let line = line.trim();

        if let Some(rest) = line.split("Logged in to ").nth(1) {
            // "<host> account <user> (keyring)"
            let mut parts = rest.split_whitespace();
            let line_host = parts.next();
            if parts.next() == Some("account") {
                if let (Some(line_host), Some(user)) = (line_host, parts.next()) {
                    if line_host == host {
                        last_seen = Some(user.to_string());
                        if fallback.is_none() {
                            fallback = Some(user.to_string());
                        }
                    } else {
                        last_seen = None;
                    }
                }
            }
        } else if line.contains("Active account: true") {
            if let Some(user) = last_seen.take() {
                return Some(user);
            }
        } else if line.contains("Active account: false") {
            last_seen = None;
        }
    }

    fallback
}
