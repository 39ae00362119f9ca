//! Small helpers shared by the binary: status prefixes, paths, logging.

use crate::error::{Error, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn prefix(label: &str, paint: impl Fn(&str) -> String) -> String {
    if colors_enabled() {
        paint(label)
    } else {
        label.to_string()
    }
}

pub fn error_prefix() -> String {
    prefix("error:", |s| s.red().bold().to_string())
}

pub fn note_prefix() -> String {
    prefix("note:", |s| s.yellow().bold().to_string())
}

pub fn info_prefix() -> String {
    prefix("info:", |s| s.blue().bold().to_string())
}

/// Display `path` relative to the working directory when possible.
pub fn rel_to_wd(path: &Path) -> String {
    let rel = std::env::current_dir()
        .ok()
        .and_then(|wd| pathdiff::diff_paths(path, wd));
    match rel {
        Some(r) if !r.as_os_str().is_empty() && path.is_absolute() => r.display().to_string(),
        _ => path.display().to_string(),
    }
}

/// Expand glob patterns into concrete paths, keeping argument order.
///
/// A pattern without glob metacharacters is kept as-is, so a missing file
/// surfaces later with its own I/O error. A pattern that matches nothing
/// is a validation error.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for pat in patterns {
        if !pat.contains(['*', '?', '[']) {
            out.push(PathBuf::from(pat));
            continue;
        }
        let paths = glob::glob(pat)
            .map_err(|e| Error::Validation(format!("invalid pattern '{}': {}", pat, e)))?;
        let mut matched: Vec<PathBuf> = paths.filter_map(|p| p.ok()).collect();
        if matched.is_empty() {
            return Err(Error::Validation(format!("no files match '{}'", pat)));
        }
        matched.sort();
        out.extend(matched);
    }
    Ok(out)
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the level.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
