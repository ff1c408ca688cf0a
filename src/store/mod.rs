//! Flat-file store layer for gh-switcher data.
//!
//! All state lives under a single config directory:
//!
//! - `profiles.jsonl` - one identity profile per line
//! - `assignments.jsonl` - one directory assignment per line
//! - `config.kdl` - user preferences
//! - `action.log` - JSONL audit trail
//!
//! The directory is resolved as: `--config-dir` flag > `GHS_CONFIG_DIR` env
//! var > `~/.config/gh-switcher/`. Every store mutation rewrites the whole
//! file through a temp file in the same directory followed by an atomic
//! rename, so a crash mid-write leaves either the old or the new contents,
//! never a truncated file.

pub mod assignments;
pub mod profiles;

use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "GHS_CONFIG_DIR";

/// Profile store filename.
pub const PROFILES_FILE: &str = "profiles.jsonl";

/// Assignment store filename.
pub const ASSIGNMENTS_FILE: &str = "assignments.jsonl";

/// Resolve the config directory.
///
/// Priority: explicit path > `GHS_CONFIG_DIR` env var > XDG config dir.
/// The directory is created if it does not exist.
pub fn config_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(path) => path.to_path_buf(),
        None => match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Other("could not determine config directory".to_string()))?
                .join("gh-switcher"),
        },
    };

    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| Error::Persistence {
            path: dir.display().to_string(),
            source: e,
        })?;
    }

    Ok(dir)
}

/// Read a JSONL file into its non-empty lines.
///
/// A missing file is an empty store, not an error.
pub fn read_jsonl(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|s| s.to_string())
        .collect())
}

/// Replace a file's contents atomically: write to a temp file in the same
/// directory, then rename over the target.
pub fn atomic_write(path: &Path, lines: &[String]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Other(format!("no parent directory for {}", path.display())))?;

    let persist_err = |e: std::io::Error| Error::Persistence {
        path: path.display().to_string(),
        source: e,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(persist_err)?;
    for line in lines {
        writeln!(tmp, "{}", line).map_err(persist_err)?;
    }
    tmp.flush().map_err(persist_err)?;

    tmp.persist(path).map_err(|e| Error::Persistence {
        path: path.display().to_string(),
        source: e.error,
    })?;

    Ok(())
}

/// Expand a leading `~` in a path to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

/// Normalize a directory path for use as an assignment key.
///
/// Relative paths are resolved against the current working directory; the
/// result is component-normalized (no `.`/`..`, no trailing slash). Symlinks
/// are deliberately not resolved, so assignments survive on paths that do not
/// exist yet.
pub fn normalize_dir(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(expand_home(path))?;

    // absolute() keeps `..` components; fold them out manually.
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }

    Ok(normalized)
}
