//! Precedence resolution for preferences.
//!
//! One entry point, [`resolve_config`], merges CLI flags over `config.kdl`
//! over built-in defaults, and records where each value came from.

use crate::Result;
use crate::config::schema::{GhsConfig, OutputFormat};
use crate::ssh::DEFAULT_TIMEOUT_SECS;
use crate::store::profiles::DEFAULT_HOST;
use std::fs;
use std::path::Path;

/// Config filename inside the config directory.
pub const CONFIG_FILE: &str = "config.kdl";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from a CLI flag
    CliFlag,
    /// Value from config.kdl
    ConfigFile,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_format: Option<OutputFormat>,
    pub ssh_timeout_secs: Option<u64>,
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub output_format: Resolved<OutputFormat>,
    pub ssh_timeout_secs: Resolved<u64>,
    pub default_host: Resolved<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
            ssh_timeout_secs: Resolved::new(DEFAULT_TIMEOUT_SECS, ValueSource::Default),
            default_host: Resolved::new(DEFAULT_HOST.to_string(), ValueSource::Default),
        }
    }
}

impl ResolvedConfig {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    pub fn ssh_timeout_secs(&self) -> u64 {
        self.ssh_timeout_secs.value
    }

    pub fn default_host(&self) -> &str {
        &self.default_host.value
    }
}

/// Resolve configuration for a config directory.
///
/// A missing config.kdl is the default configuration; an unparseable one is
/// an error (the user edited it, they should hear about the typo).
pub fn resolve_config(config_dir: &Path, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let mut resolved = ResolvedConfig::default();

    let path = config_dir.join(CONFIG_FILE);
    if path.exists() {
        let text = fs::read_to_string(&path)?;
        let doc = text
            .parse::<kdl::KdlDocument>()
            .map_err(|e| crate::Error::Other(format!("{} is not valid KDL: {}", path.display(), e)))?;
        let file_config = GhsConfig::from_kdl(&doc);

        if let Some(format) = file_config.output_format {
            resolved.output_format = Resolved::new(format, ValueSource::ConfigFile);
        }
        if let Some(secs) = file_config.ssh_timeout_secs {
            resolved.ssh_timeout_secs = Resolved::new(secs, ValueSource::ConfigFile);
        }
        if let Some(host) = file_config.default_host {
            resolved.default_host = Resolved::new(host, ValueSource::ConfigFile);
        }
    }

    if let Some(format) = overrides.output_format {
        resolved.output_format = Resolved::new(format, ValueSource::CliFlag);
    }
    if let Some(secs) = overrides.ssh_timeout_secs {
        resolved.ssh_timeout_secs = Resolved::new(secs, ValueSource::CliFlag);
    }

    Ok(resolved)
}
