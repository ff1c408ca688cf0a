//! gh-switcher - per-directory GitHub identity management.
//!
//! This library provides the core functionality for the `ghs` CLI tool:
//! identity profiles, directory assignments, identity resolution, switching
//! the live `git`/`gh` state, and guarding commits against the wrong identity.

pub mod action_log;
pub mod cli;
pub mod commands;
pub mod config;
pub mod gh;
pub mod git;
pub mod guard;
pub mod resolver;
pub mod ssh;
pub mod store;
pub mod switch;


/// Library-level error type for gh-switcher operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("identity not found: {0} (run `ghs list` to see configured identities)")]
    NotFound(String),

    #[error("no assignment for {0} (run `ghs assign --list` to see assignments)")]
    AssignmentNotFound(String),

    #[error("identity already exists: {0} (use `ghs edit {0} <field> <value>` to change it)")]
    DuplicateIdentity(String),

    #[error(
        "unknown field: {0} (recognized fields: name, email, signing-key, ssh-key, host, auto-sign)"
    )]
    InvalidField(String),

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error(
        "failed to activate gh auth for {user} on {host}: {reason} (run `gh auth login --hostname {host}` to register the account)"
    )]
    AuthSwitchFailed {
        user: String,
        host: String,
        reason: String,
    },

    #[error("SSH authentication rejected by {host} (check that the key is uploaded to the account)")]
    SshAuthRejected { host: String },

    #[error("SSH host unreachable: {host} ({reason})")]
    SshUnreachable { host: String, reason: String },

    #[error("failed to persist {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git command failed: {0}")]
    GitCommand(String),

    #[error("not a git repository: {0} (run `git init` or move into a repository)")]
    NotAGitRepo(String),

    #[error(
        "a pre-commit hook from another tool is installed (re-run with --force to back it up and replace it)"
    )]
    HookConflict,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for gh-switcher operations.
pub type Result<T> = std::result::Result<T, Error>;
