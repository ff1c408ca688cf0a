//! Bounded SSH authentication probe.
//!
//! Spawns `ssh -T git@<host>` with the candidate key and classifies the
//! outcome. GitHub always refuses the shell, so a successful authentication
//! still exits non-zero; classification goes off the banner text, not the
//! exit code. The probe is the only network operation in the tool and the
//! only one with a timeout.

use crate::store::expand_home;
use crate::{Error, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default wall-clock budget for a probe.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Outcome of probing a key against a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The host accepted the key.
    Ok { user: Option<String> },
    /// The host answered and rejected the key.
    AuthRejected,
    /// Timeout, DNS failure, or no route; nothing can be said about the key.
    Unreachable { reason: String },
}

/// Probe `key_path` against `git@<host>` within `timeout`.
pub fn probe(key_path: &Path, host: &str, timeout: Duration) -> Result<ProbeOutcome> {
    let key = expand_home(key_path);
    if !key.exists() {
        return Err(Error::Other(format!(
            "SSH key not found: {} (check the profile's ssh-key field)",
            key.display()
        )));
    }

    let connect_timeout = format!("ConnectTimeout={}", timeout.as_secs().max(1));
    let mut child = Command::new("ssh")
        .arg("-T")
        .arg("-i")
        .arg(&key)
        .args(["-o", "BatchMode=yes"])
        .args(["-o", "IdentitiesOnly=yes"])
        .args(["-o", "StrictHostKeyChecking=accept-new"])
        .args(["-o", &connect_timeout])
        .arg(format!("git@{}", host))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Other(format!("failed to run ssh: {}", e)))?;

    // ConnectTimeout only bounds the TCP connect; the overall wall clock
    // needs its own guard.
    match child
        .wait_timeout(timeout + Duration::from_secs(2))
        .map_err(|e| Error::Other(format!("failed to wait for ssh: {}", e)))?
    {
        Some(_status) => {}
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(ProbeOutcome::Unreachable {
                reason: format!("timed out after {}s", timeout.as_secs()),
            });
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| Error::Other(format!("failed to collect ssh output: {}", e)))?;

    let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
    text.push('\n');
    text.push_str(&String::from_utf8_lossy(&output.stdout));

    Ok(classify(&text))
}

/// Classify ssh output into a probe outcome.
pub fn classify(output: &str) -> ProbeOutcome {
    // "Hi alice! You've successfully authenticated, but GitHub does not
    // provide shell access."
    if output.contains("successfully authenticated") {
        let user = output
            .lines()
            .find(|l| l.contains("successfully authenticated"))
            .and_then(|l| l.split_once("Hi "))
            .and_then(|(_, rest)| rest.split(['!', ' ']).next())
            .filter(|u| !u.is_empty())
            .map(|s| s.to_string());
        return ProbeOutcome::Ok { user };
    }

    if output.contains("Permission denied") {
        return ProbeOutcome::AuthRejected;
    }

    let reason = output
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("no response")
        .trim()
        .to_string();
    ProbeOutcome::Unreachable { reason }
}
