//! CLI argument definitions for gh-switcher.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Version string including build metadata from build.rs.
fn version_str() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| {
        format!(
            "{} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GHS_GIT_COMMIT"),
            env!("GHS_BUILD_TIMESTAMP"),
        )
    })
}

/// gh-switcher - per-directory GitHub identity management.
///
/// Keep one profile per GitHub account, assign directories to profiles, and
/// `ghs switch` between them. `ghs guard install` adds a pre-commit hook
/// that blocks commits made under the wrong identity.
#[derive(Parser, Debug)]
#[command(name = "ghs")]
#[command(author, version = version_str(), about = "Switch between GitHub account identities per directory", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Directory holding profiles, assignments and preferences.
    /// Can also be set via the GHS_CONFIG_DIR environment variable.
    #[arg(long = "config-dir", global = true, env = "GHS_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new identity profile
    Add {
        /// GitHub username (unique, becomes the profile key)
        username: String,

        /// Display name written to git user.name (defaults to the username)
        #[arg(long)]
        name: Option<String>,

        /// Email written to git user.email
        #[arg(short, long)]
        email: Option<String>,

        /// SSH private key path (e.g. ~/.ssh/id_work); probed on creation
        /// unless the host is unreachable
        #[arg(long = "ssh-key")]
        ssh_key: Option<String>,

        /// GPG key id or SSH signing key path for user.signingkey
        #[arg(long = "signing-key")]
        signing_key: Option<String>,

        /// GitHub host for this identity (default: github.com, or the
        /// default-host preference)
        #[arg(long)]
        host: Option<String>,

        /// Enable commit signing (commit.gpgsign) when switching to this
        /// identity
        #[arg(long = "auto-sign")]
        auto_sign: bool,
    },

    /// Remove an identity profile (assignments are swept separately with
    /// `assign --clean`)
    Remove {
        /// Username or numeric index from `ghs list`
        user: String,
    },

    /// Edit one field of an identity profile
    Edit {
        /// Username or numeric index from `ghs list`
        user: String,

        /// Field to change: name, email, signing-key, ssh-key, host, auto-sign
        field: String,

        /// New value (empty string clears an optional field)
        value: String,
    },

    /// List identity profiles in order (the number is the index shortcut)
    List,

    /// Show one profile (defaults to the currently active identity)
    Show {
        /// Username or numeric index from `ghs list`
        user: Option<String>,
    },

    /// Show the expected vs. actual identity for the current directory
    Status,

    /// Apply an identity to git config, gh auth and SSH key pinning
    Switch {
        /// Username or numeric index from `ghs list`
        user: String,
    },

    /// Manage directory-to-identity assignments
    ///
    /// With no flags, binds a directory to an identity. A single positional
    /// that names a known profile is treated as the user (directory defaults
    /// to the current one); otherwise it is treated as the directory (user
    /// defaults to the currently active identity).
    Assign {
        /// Directory and/or user, in either order (see above)
        #[arg(value_name = "DIR_OR_USER")]
        args: Vec<String>,

        /// List all assignments
        #[arg(long, conflicts_with_all = ["remove", "clean"])]
        list: bool,

        /// Remove the assignment for a directory (default: current)
        #[arg(long, conflicts_with = "clean")]
        remove: bool,

        /// Drop assignments whose identity was removed or whose directory no
        /// longer exists
        #[arg(long)]
        clean: bool,
    },

    /// Manage the pre-commit identity guard
    Guard {
        #[command(subcommand)]
        command: GuardCommands,
    },

    /// Probe an identity's SSH key against its host
    #[command(name = "test-ssh")]
    TestSsh {
        /// Username or numeric index (defaults to the currently active
        /// identity)
        user: Option<String>,

        /// Print nothing; communicate through the exit code only
        /// (0 ok, 1 auth rejected, 2 unreachable)
        #[arg(short, long)]
        quiet: bool,
    },
}

/// Guard subcommands
#[derive(Subcommand, Debug)]
pub enum GuardCommands {
    /// Install the pre-commit hook into this repository
    Install {
        /// Back up and replace a pre-commit hook from another tool
        #[arg(long)]
        force: bool,
    },

    /// Remove the hook (restores a backed-up foreign hook if present)
    Uninstall,

    /// Report whether the hook is installed here
    Status,

    /// Run the guard check once and report the outcome
    ///
    /// Exit codes: 0 matched or unassigned (warning), 1 mismatched.
    /// This is what the installed hook runs on every commit.
    Test,
}
