//! Preference management for gh-switcher.
//!
//! User preferences live in `config.kdl` inside the tool's config directory:
//!
//! ```kdl
//! output-format "human"    // or "json"
//! ssh-timeout-secs 5
//! default-host "github.com"
//! ```
//!
//! Precedence: CLI flag > config.kdl > built-in default. The [`resolver`]
//! module tracks where each resolved value came from so `ghs status` can
//! show it.

pub mod resolver;
pub mod schema;

pub use resolver::{ConfigOverrides, Resolved, ResolvedConfig, ValueSource, resolve_config};
pub use schema::{GhsConfig, OutputFormat};
