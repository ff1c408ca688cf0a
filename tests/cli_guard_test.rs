//! Integration tests for the commit guard: hook management and validation.

mod common;
use common::TestEnv;

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

fn hook_path(env: &TestEnv) -> std::path::PathBuf {
    env.repo_path().join(".git").join("hooks").join("pre-commit")
}

#[test]
fn test_guard_outside_repo_fails() {
    let env = TestEnv::new();

    env.ghs()
        .args(["guard", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a git repository"));
}

#[test]
fn test_guard_install_status_uninstall() {
    let env = TestEnv::new();
    env.init_git();

    let output = env.ghs().args(["guard", "status"]).output().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["status"], "not-installed");

    env.ghs().args(["guard", "install"]).assert().success();
    assert!(hook_path(&env).exists());

    let output = env.ghs().args(["guard", "status"]).output().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["status"], "installed");

    // Re-install is an idempotent upgrade.
    env.ghs().args(["guard", "install"]).assert().success();

    env.ghs().args(["guard", "uninstall"]).assert().success();
    assert!(!hook_path(&env).exists());
}

#[test]
fn test_guard_install_respects_foreign_hook() {
    let env = TestEnv::new();
    env.init_git();
    fs::create_dir_all(hook_path(&env).parent().unwrap()).unwrap();
    fs::write(hook_path(&env), "#!/bin/sh\necho other tool\n").unwrap();

    env.ghs()
        .args(["guard", "install"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    env.ghs()
        .args(["guard", "install", "--force"])
        .assert()
        .success();

    // Uninstall puts the foreign hook back.
    env.ghs().args(["guard", "uninstall"]).assert().success();
    let restored = fs::read_to_string(hook_path(&env)).unwrap();
    assert!(restored.contains("other tool"));
}

#[test]
fn test_guard_test_unassigned_warns_but_passes() {
    let env = TestEnv::new();
    env.init_git();
    env.fake_gh_active("alice");

    env.ghs()
        .args(["guard", "test", "--human"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unassigned"));
}

#[test]
fn test_guard_test_matched_is_silent_success() {
    let env = TestEnv::new();
    env.init_git();
    env.fake_gh_active("alice");

    env.ghs()
        .args(["add", "alice", "--email", "alice@example.com"])
        .assert()
        .success();
    env.ghs().args(["assign", "alice"]).assert().success();
    env.git_config_local("user.name", "alice");
    env.git_config_local("user.email", "alice@example.com");

    // Human mode: silent success, like any well-behaved hook.
    env.ghs()
        .args(["guard", "test", "--human"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    // JSON mode still reports the outcome.
    let output = env.ghs().args(["guard", "test"]).output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["outcome"], "matched");
}

#[test]
fn test_guard_test_wrong_auth_user_blocks() {
    let env = TestEnv::new();
    env.init_git();
    env.fake_gh_active("bob");

    env.ghs()
        .args(["add", "alice", "--email", "alice@example.com"])
        .assert()
        .success();
    env.ghs().args(["assign", "alice"]).assert().success();
    env.git_config_local("user.name", "alice");
    env.git_config_local("user.email", "alice@example.com");

    let output = env.ghs().args(["guard", "test"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["outcome"], "mismatched");
    assert_eq!(parsed["mismatches"][0]["field"], "auth-user");
    assert_eq!(parsed["mismatches"][0]["actual"], "bob");
}

#[test]
fn test_guard_test_wrong_email_blocks() {
    let env = TestEnv::new();
    env.init_git();
    env.fake_gh_active("alice");

    env.ghs()
        .args(["add", "alice", "--email", "alice@example.com"])
        .assert()
        .success();
    env.ghs().args(["assign", "alice"]).assert().success();
    env.git_config_local("user.name", "alice");
    env.git_config_local("user.email", "wrong@example.com");

    env.ghs()
        .args(["guard", "test", "--human"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("MISMATCHED"))
        .stdout(predicate::str::contains("ghs switch alice"));
}

#[test]
fn test_guard_scenario_switch_fixes_mismatch() {
    let env = TestEnv::new();
    env.init_git();

    env.ghs()
        .args(["add", "alice", "--email", "alice@example.com"])
        .assert()
        .success();
    env.ghs()
        .args(["add", "bob", "--email", "bob@example.com"])
        .assert()
        .success();
    env.ghs().args(["assign", "alice"]).assert().success();

    // Live state belongs to bob: guard blocks.
    env.fake_gh_active("bob");
    env.ghs().args(["switch", "bob"]).assert().success();
    env.ghs().args(["guard", "test"]).assert().code(1);

    // Switch to the assigned identity: guard passes.
    env.fake_gh_active("alice");
    env.ghs().args(["switch", "alice"]).assert().success();
    env.ghs().args(["guard", "test"]).assert().success();
}

/// Run the installed hook script directly, the way git would.
fn run_hook(env: &TestEnv, extra_env: &[(&str, &str)]) -> std::process::Output {
    let hook = hook_path(env);

    // Make ghs resolvable from the hook via PATH.
    let ghs_binary = env!("CARGO_BIN_EXE_ghs");
    let ghs_dir = Path::new(ghs_binary).parent().unwrap();
    let path_env = std::env::var("PATH").unwrap_or_default();

    let mut cmd = Command::new(&hook);
    cmd.current_dir(env.repo_path())
        .env("GHS_CONFIG_DIR", env.config_path())
        .env("HOME", env.home_dir.path())
        .env("PATH", format!("{}:{}", ghs_dir.display(), path_env));
    for (key, value) in extra_env {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to run hook")
}

#[test]
fn test_hook_script_blocks_and_bypasses() {
    let env = TestEnv::new();
    env.init_git();
    env.ghs().args(["guard", "install"]).assert().success();

    // Mismatched identity set up directly through the stores.
    env.ghs()
        .args(["add", "alice", "--email", "alice@example.com"])
        .assert()
        .success();
    env.ghs().args(["assign", "alice"]).assert().success();
    env.git_config_local("user.name", "someone-else");
    env.git_config_local("user.email", "wrong@example.com");

    let output = run_hook(&env, &[]);
    assert!(!output.status.success(), "hook should block a mismatch");

    // GHS_SKIP_HOOK=1 bypasses validation entirely.
    let output = run_hook(&env, &[("GHS_SKIP_HOOK", "1")]);
    assert!(output.status.success(), "bypass must be honored");
}

#[test]
fn test_hook_is_executable() {
    let env = TestEnv::new();
    env.init_git();
    env.ghs().args(["guard", "install"]).assert().success();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(hook_path(&env)).unwrap().permissions().mode();
        assert!(mode & 0o111 != 0, "hook should be executable");
    }
}
