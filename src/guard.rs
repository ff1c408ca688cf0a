//! Guard validator: compare the expected identity against live git/gh state.
//!
//! The guard is read-only and runs on every commit via the installed
//! pre-commit hook, so it must stay fast: two local subprocess reads, no
//! network. Classification is a pure function over already-gathered state,
//! tested without any external tools.

use crate::gh::AuthBackend;
use crate::git::{GitBackend, GitIdentity, hooks_dir};
use crate::resolver::resolve;
use crate::store::assignments::AssignmentStore;
use crate::store::profiles::{Profile, ProfileStore};
use crate::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The installed pre-commit hook script.
pub const HOOK_SCRIPT: &str = include_str!("../hooks/pre-commit");

/// First comment line identifying our hook.
const HOOK_MARKER: &str = "# gh-switcher guard hook";

/// Where a foreign hook is parked when `--force` replaces it.
pub const BACKUP_NAME: &str = "pre-commit.ghs-backup";

/// One disagreement between the expected profile and observed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// What was compared: "auth-user", "name" or "email".
    pub field: &'static str,
    pub expected: String,
    /// Observed value; `None` when nothing is configured at all.
    pub actual: Option<String>,
}

/// Terminal classification of one guard invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GuardOutcome {
    /// Expected identity and observed state agree.
    Matched { username: String },
    /// An identity is assigned here, but the observed state disagrees.
    Mismatched {
        username: String,
        mismatches: Vec<Mismatch>,
    },
    /// No identity assigned for this directory or any ancestor. A warning,
    /// never a hard failure. `dangling` names an assignment whose profile
    /// has since been removed (sweep with `ghs assign --clean`).
    Unassigned {
        #[serde(skip_serializing_if = "Option::is_none")]
        dangling: Option<String>,
    },
}

/// Observed auth state, as far as the guard can see it locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActualAuth {
    /// gh is not installed; the auth comparison is skipped.
    Unavailable,
    /// gh is installed; the active account for the profile's host, if any.
    Active(Option<String>),
}

/// Pure classification of expected vs. observed identity.
pub fn classify(profile: &Profile, git: &GitIdentity, auth: &ActualAuth) -> GuardOutcome {
    let mut mismatches = Vec::new();

    if let ActualAuth::Active(user) = auth {
        if user.as_deref() != Some(profile.username.as_str()) {
            mismatches.push(Mismatch {
                field: "auth-user",
                expected: profile.username.clone(),
                actual: user.clone(),
            });
        }
    }

    let expected_name = profile.name.as_deref().unwrap_or(&profile.username);
    if git.name.as_deref() != Some(expected_name) {
        mismatches.push(Mismatch {
            field: "name",
            expected: expected_name.to_string(),
            actual: git.name.clone(),
        });
    }

    if let Some(expected_email) = &profile.email {
        if git.email.as_deref() != Some(expected_email.as_str()) {
            mismatches.push(Mismatch {
                field: "email",
                expected: expected_email.clone(),
                actual: git.email.clone(),
            });
        }
    }

    if mismatches.is_empty() {
        GuardOutcome::Matched {
            username: profile.username.clone(),
        }
    } else {
        GuardOutcome::Mismatched {
            username: profile.username.clone(),
            mismatches,
        }
    }
}

/// Full guard check for a working directory: resolve the expected identity,
/// observe the actual state, classify.
pub fn check(
    cwd: &Path,
    profiles: &ProfileStore,
    assignments: &AssignmentStore,
    git: &impl GitBackend,
    auth: &impl AuthBackend,
) -> Result<GuardOutcome> {
    let Some(assignment) = resolve(cwd, assignments)? else {
        return Ok(GuardOutcome::Unassigned { dangling: None });
    };

    let profile = match profiles.get(&assignment.username) {
        Ok(profile) => profile,
        // Assignment outlived its profile: warn, don't block.
        Err(Error::NotFound(_)) => {
            return Ok(GuardOutcome::Unassigned {
                dangling: Some(assignment.username),
            });
        }
        Err(e) => return Err(e),
    };

    let git_identity = git.read_identity()?;
    let actual_auth = if auth.is_available() {
        ActualAuth::Active(auth.active_user(&profile.host)?)
    } else {
        ActualAuth::Unavailable
    };

    Ok(classify(profile, &git_identity, &actual_auth))
}

/// Installation state of the pre-commit hook in a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookStatus {
    Installed,
    NotInstalled,
    /// A pre-commit hook exists but was not written by gh-switcher.
    Foreign,
}

fn hook_path(repo_root: &Path) -> Result<PathBuf> {
    Ok(hooks_dir(repo_root)?.join("pre-commit"))
}

fn is_our_hook(content: &str) -> bool {
    content.contains(HOOK_MARKER)
}

/// Report the hook installation state for a repository.
pub fn hook_status(repo_root: &Path) -> Result<HookStatus> {
    let path = hook_path(repo_root)?;
    if !path.exists() {
        return Ok(HookStatus::NotInstalled);
    }
    let content = fs::read_to_string(&path)?;
    Ok(if is_our_hook(&content) {
        HookStatus::Installed
    } else {
        HookStatus::Foreign
    })
}

/// Result of `guard install`.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub path: PathBuf,
    /// True when a foreign hook was backed up and replaced (`--force`).
    pub replaced_foreign: bool,
}

/// Install the guard hook into `.git/hooks/pre-commit`.
///
/// Re-installing over our own hook is an idempotent upgrade. A foreign hook
/// is refused unless `force`, in which case it is parked next to the hook
/// as [`BACKUP_NAME`] and restored by `guard uninstall`.
pub fn install_hook(repo_root: &Path, force: bool) -> Result<InstallReport> {
    let path = hook_path(repo_root)?;
    let dir = path
        .parent()
        .ok_or_else(|| Error::Other("hook path has no parent".to_string()))?;
    fs::create_dir_all(dir)?;

    let mut replaced_foreign = false;
    if path.exists() {
        let existing = fs::read_to_string(&path)?;
        if !is_our_hook(&existing) {
            if !force {
                return Err(Error::HookConflict);
            }
            fs::rename(&path, dir.join(BACKUP_NAME))?;
            replaced_foreign = true;
        }
    }

    fs::write(&path, HOOK_SCRIPT)?;
    set_executable(&path)?;

    Ok(InstallReport {
        path,
        replaced_foreign,
    })
}

/// Result of `guard uninstall`.
#[derive(Debug, Clone, Serialize)]
pub struct UninstallReport {
    pub removed: bool,
    /// True when a parked foreign hook was put back in place.
    pub restored_backup: bool,
}

/// Remove our hook; a foreign hook is left untouched and reported as an
/// error so the user knows nothing happened.
pub fn uninstall_hook(repo_root: &Path) -> Result<UninstallReport> {
    let path = hook_path(repo_root)?;
    if !path.exists() {
        return Ok(UninstallReport {
            removed: false,
            restored_backup: false,
        });
    }

    let content = fs::read_to_string(&path)?;
    if !is_our_hook(&content) {
        return Err(Error::Other(
            "the pre-commit hook was not installed by gh-switcher; leaving it alone".to_string(),
        ));
    }

    fs::remove_file(&path)?;

    let backup = path
        .parent()
        .map(|d| d.join(BACKUP_NAME))
        .filter(|b| b.exists());
    let restored_backup = match backup {
        Some(backup) => {
            fs::rename(backup, &path)?;
            true
        }
        None => false,
    };

    Ok(UninstallReport {
        removed: true,
        restored_backup,
    })
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;
    use tempfile::TempDir;

    fn profile(username: &str, name: &str, email: &str) -> Profile {
        let mut p = Profile::new(username.to_string());
        p.name = Some(name.to_string());
        p.email = Some(email.to_string());
        p
    }

    fn observed(name: &str, email: &str) -> GitIdentity {
        GitIdentity {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_matched() {
        let alice = profile("alice", "Alice Ann", "alice@example.com");
        let outcome = classify(
            &alice,
            &observed("Alice Ann", "alice@example.com"),
            &ActualAuth::Active(Some("alice".to_string())),
        );
        assert_eq!(
            outcome,
            GuardOutcome::Matched {
                username: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_classify_each_field_mismatch() {
        let alice = profile("alice", "Alice Ann", "alice@example.com");
        let auth_alice = ActualAuth::Active(Some("alice".to_string()));

        let outcome = classify(&alice, &observed("Mallory", "alice@example.com"), &auth_alice);
        let GuardOutcome::Mismatched { mismatches, .. } = outcome else {
            panic!("expected Mismatched");
        };
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].field, "name");

        let outcome = classify(&alice, &observed("Alice Ann", "wrong@example.com"), &auth_alice);
        let GuardOutcome::Mismatched { mismatches, .. } = outcome else {
            panic!("expected Mismatched");
        };
        assert_eq!(mismatches[0].field, "email");

        let outcome = classify(
            &alice,
            &observed("Alice Ann", "alice@example.com"),
            &ActualAuth::Active(Some("bob".to_string())),
        );
        let GuardOutcome::Mismatched { mismatches, .. } = outcome else {
            panic!("expected Mismatched");
        };
        assert_eq!(mismatches[0].field, "auth-user");
        assert_eq!(mismatches[0].actual.as_deref(), Some("bob"));
    }

    #[test]
    fn test_classify_no_active_account_is_mismatch() {
        let alice = profile("alice", "Alice Ann", "alice@example.com");
        let outcome = classify(
            &alice,
            &observed("Alice Ann", "alice@example.com"),
            &ActualAuth::Active(None),
        );
        assert!(matches!(outcome, GuardOutcome::Mismatched { .. }));
    }

    #[test]
    fn test_classify_gh_unavailable_skips_auth_comparison() {
        let alice = profile("alice", "Alice Ann", "alice@example.com");
        let outcome = classify(
            &alice,
            &observed("Alice Ann", "alice@example.com"),
            &ActualAuth::Unavailable,
        );
        assert!(matches!(outcome, GuardOutcome::Matched { .. }));
    }

    #[test]
    fn test_classify_unset_git_identity_reports_none() {
        let alice = profile("alice", "Alice Ann", "alice@example.com");
        let outcome = classify(
            &alice,
            &GitIdentity::default(),
            &ActualAuth::Active(Some("alice".to_string())),
        );
        let GuardOutcome::Mismatched { mismatches, .. } = outcome else {
            panic!("expected Mismatched");
        };
        assert!(mismatches.iter().any(|m| m.field == "name" && m.actual.is_none()));
    }

    // The alice/bob scenario: /repo assigned to alice, state switched to bob,
    // guard flags the commit; switching back to alice clears it.
    #[test]
    fn test_check_scenario_wrong_account_then_right() {
        use crate::gh::AuthBackend;
        use std::cell::RefCell;

        struct ScriptedGit(RefCell<GitIdentity>);
        impl GitBackend for ScriptedGit {
            fn read_identity(&self) -> crate::Result<GitIdentity> {
                Ok(self.0.borrow().clone())
            }
            fn set_global(&self, _key: &str, _value: &str) -> crate::Result<()> {
                unreachable!("guard never writes")
            }
        }

        struct ScriptedAuth(RefCell<Option<String>>);
        impl AuthBackend for ScriptedAuth {
            fn is_available(&self) -> bool {
                true
            }
            fn active_user(&self, _host: &str) -> crate::Result<Option<String>> {
                Ok(self.0.borrow().clone())
            }
            fn switch_user(&self, _host: &str, _user: &str) -> crate::Result<()> {
                unreachable!("guard never switches")
            }
        }

        let env = TestEnv::new();
        let mut profiles = env.profiles();
        profiles.add(profile("alice", "Alice", "alice@example.com")).unwrap();
        profiles.add(profile("bob", "Bob", "bob@example.com")).unwrap();

        let mut assignments = env.assignments();
        assignments.assign(env.path(), "alice").unwrap();

        // State reflects bob: guard must block.
        let git = ScriptedGit(RefCell::new(observed("Bob", "bob@example.com")));
        let auth = ScriptedAuth(RefCell::new(Some("bob".to_string())));
        let outcome = check(env.path(), &profiles, &assignments, &git, &auth).unwrap();
        assert!(matches!(outcome, GuardOutcome::Mismatched { .. }));

        // Back to alice: guard passes.
        *git.0.borrow_mut() = observed("Alice", "alice@example.com");
        *auth.0.borrow_mut() = Some("alice".to_string());
        let outcome = check(env.path(), &profiles, &assignments, &git, &auth).unwrap();
        assert_eq!(
            outcome,
            GuardOutcome::Matched {
                username: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_check_unassigned_and_dangling() {
        struct NoGit;
        impl GitBackend for NoGit {
            fn read_identity(&self) -> crate::Result<GitIdentity> {
                Ok(GitIdentity::default())
            }
            fn set_global(&self, _k: &str, _v: &str) -> crate::Result<()> {
                unreachable!()
            }
        }
        struct NoAuth;
        impl crate::gh::AuthBackend for NoAuth {
            fn is_available(&self) -> bool {
                false
            }
            fn active_user(&self, _h: &str) -> crate::Result<Option<String>> {
                Ok(None)
            }
            fn switch_user(&self, _h: &str, _u: &str) -> crate::Result<()> {
                unreachable!()
            }
        }

        let env = TestEnv::new();
        let profiles = env.profiles();
        let mut assignments = env.assignments();

        let outcome = check(env.path(), &profiles, &assignments, &NoGit, &NoAuth).unwrap();
        assert_eq!(outcome, GuardOutcome::Unassigned { dangling: None });

        // Assignment pointing at a profile that does not exist.
        assignments.assign(env.path(), "ghost").unwrap();
        let outcome = check(env.path(), &profiles, &assignments, &NoGit, &NoAuth).unwrap();
        assert_eq!(
            outcome,
            GuardOutcome::Unassigned {
                dangling: Some("ghost".to_string())
            }
        );
    }

    fn fake_repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git").join("hooks")).unwrap();
        temp
    }

    #[test]
    fn test_hook_install_status_uninstall() {
        let repo = fake_repo();

        assert_eq!(hook_status(repo.path()).unwrap(), HookStatus::NotInstalled);

        let report = install_hook(repo.path(), false).unwrap();
        assert!(!report.replaced_foreign);
        assert_eq!(hook_status(repo.path()).unwrap(), HookStatus::Installed);

        // Idempotent re-install.
        install_hook(repo.path(), false).unwrap();
        assert_eq!(hook_status(repo.path()).unwrap(), HookStatus::Installed);

        let report = uninstall_hook(repo.path()).unwrap();
        assert!(report.removed);
        assert!(!report.restored_backup);
        assert_eq!(hook_status(repo.path()).unwrap(), HookStatus::NotInstalled);
    }

    #[test]
    fn test_hook_executable_bit() {
        let repo = fake_repo();
        let report = install_hook(repo.path(), false).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&report.path).unwrap().permissions().mode();
            assert!(mode & 0o111 != 0, "hook should be executable");
        }
        let _ = report;
    }

    #[test]
    fn test_foreign_hook_refused_then_forced() {
        let repo = fake_repo();
        let path = repo.path().join(".git").join("hooks").join("pre-commit");
        fs::write(&path, "#!/bin/sh\necho other tool\n").unwrap();

        assert_eq!(hook_status(repo.path()).unwrap(), HookStatus::Foreign);
        assert!(matches!(
            install_hook(repo.path(), false),
            Err(Error::HookConflict)
        ));

        let report = install_hook(repo.path(), true).unwrap();
        assert!(report.replaced_foreign);
        let backup = repo.path().join(".git").join("hooks").join(BACKUP_NAME);
        assert!(backup.exists());

        // Uninstall restores the parked hook.
        let report = uninstall_hook(repo.path()).unwrap();
        assert!(report.removed);
        assert!(report.restored_backup);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("other tool"));
    }

    #[test]
    fn test_uninstall_missing_hook_is_noop() {
        let repo = fake_repo();
        let report = uninstall_hook(repo.path()).unwrap();
        assert!(!report.removed);
    }

    #[test]
    fn test_uninstall_refuses_foreign_hook() {
        let repo = fake_repo();
        let path = repo.path().join(".git").join("hooks").join("pre-commit");
        fs::write(&path, "#!/bin/sh\necho other tool\n").unwrap();

        assert!(uninstall_hook(repo.path()).is_err());
        assert!(path.exists());
    }

    #[test]
    fn test_not_a_repo() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            hook_status(temp.path()),
            Err(Error::NotAGitRepo(_))
        ));
    }
}
