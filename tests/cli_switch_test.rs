//! Integration tests for `ghs switch` against a fake gh and isolated HOME.

mod common;
use common::TestEnv;

use predicates::prelude::*;

fn add_alice(env: &TestEnv) {
    env.ghs()
        .args([
            "add",
            "alice",
            "--name",
            "Alice Ann",
            "--email",
            "alice@example.com",
        ])
        .assert()
        .success();
}

#[test]
fn test_switch_applies_git_config() {
    let env = TestEnv::new();
    env.fake_gh_active("alice");
    add_alice(&env);

    env.ghs().args(["switch", "alice"]).assert().success();

    assert_eq!(env.git_config_global("user.name").as_deref(), Some("Alice Ann"));
    assert_eq!(
        env.git_config_global("user.email").as_deref(),
        Some("alice@example.com")
    );
}

#[test]
fn test_switch_is_idempotent() {
    let env = TestEnv::new();
    env.fake_gh_active("alice");
    add_alice(&env);

    env.ghs().args(["switch", "alice"]).assert().success();
    let name = env.git_config_global("user.name");
    let email = env.git_config_global("user.email");

    env.ghs().args(["switch", "alice"]).assert().success();
    assert_eq!(env.git_config_global("user.name"), name);
    assert_eq!(env.git_config_global("user.email"), email);
}

#[test]
fn test_switch_by_index() {
    let env = TestEnv::new();
    env.fake_gh_active("bob");
    add_alice(&env);
    env.ghs()
        .args(["add", "bob", "--email", "bob@example.com"])
        .assert()
        .success();

    env.ghs().args(["switch", "2"]).assert().success();
    assert_eq!(env.git_config_global("user.email").as_deref(), Some("bob@example.com"));
}

#[test]
fn test_switch_updates_last_used() {
    let env = TestEnv::new();
    env.fake_gh_active("alice");
    add_alice(&env);

    let output = env.ghs().args(["show", "alice"]).output().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed.get("last_used").is_none());

    env.ghs().args(["switch", "alice"]).assert().success();

    let output = env.ghs().args(["show", "alice"]).output().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed.get("last_used").is_some());
}

#[test]
fn test_switch_pins_ssh_key() {
    let env = TestEnv::new();
    env.fake_gh_active("alice");
    add_alice(&env);

    // Set the key through edit so no probe fires.
    env.ghs()
        .args(["edit", "alice", "ssh-key", "~/.ssh/id_alice"])
        .assert()
        .success();

    env.ghs().args(["switch", "alice"]).assert().success();

    let ssh_command = env.git_config_global("core.sshCommand").unwrap();
    assert!(ssh_command.contains("id_alice"));
    assert!(ssh_command.contains("IdentitiesOnly=yes"));
    // ~ expanded before use
    assert!(!ssh_command.contains('~'));
}

#[test]
fn test_switch_signing_configuration() {
    let env = TestEnv::new();
    env.fake_gh_active("alice");
    env.ghs()
        .args([
            "add",
            "alice",
            "--signing-key",
            "ABCDEF123456",
            "--auto-sign",
        ])
        .assert()
        .success();

    env.ghs().args(["switch", "alice"]).assert().success();

    assert_eq!(
        env.git_config_global("user.signingkey").as_deref(),
        Some("ABCDEF123456")
    );
    assert_eq!(env.git_config_global("commit.gpgsign").as_deref(), Some("true"));
}

#[test]
fn test_switch_unknown_identity_fails() {
    let env = TestEnv::new();
    env.fake_gh_active("alice");

    env.ghs()
        .args(["switch", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("identity not found"));
}

#[test]
fn test_switch_fails_when_gh_refuses() {
    let env = TestEnv::new();
    env.fake_gh_refusing("no such account");
    add_alice(&env);

    env.ghs()
        .args(["switch", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to activate gh auth"))
        .stderr(predicate::str::contains("gh auth login"));

    // Git config writes before the auth step are allowed to stand.
    assert_eq!(env.git_config_global("user.name").as_deref(), Some("Alice Ann"));
}

#[test]
fn test_switch_human_output() {
    let env = TestEnv::new();
    env.fake_gh_active("alice");
    add_alice(&env);

    env.ghs()
        .args(["switch", "alice", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Switched to alice"));
}
