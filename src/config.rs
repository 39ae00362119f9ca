//! Configuration discovery and effective settings resolution.
//!
//! The tool reads `falco-rules-tools.toml|yaml|yml` from the repository
//! root (or closest ancestor) and merges it with CLI flags to produce an
//! `Effective` config.
//! Defaults:
//! - `falco_image`: `falcosecurity/falco-no-driver:master`
//! - `falco_entrypoint`: `/usr/bin/falco`
//! - `output`: `human`
//! - `explorer.registry|rules_dir|index`: `registry.yaml`, `rules`, `index.json`
//! - `explorer.cross_file`: false
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::checker::engine::{DEFAULT_ENTRYPOINT, DEFAULT_IMAGE};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment key holding the OCI repository prefix for registry artifacts.
pub const OCI_REPO_PREFIX_ENV: &str = "OCI_REPO_PREFIX";

const CONFIG_BASENAME: &str = "falco-rules-tools";

#[derive(Debug, Default, Deserialize, Clone)]
/// Explorer section under `[explorer]`.
pub struct ExplorerCfg {
    pub registry: Option<String>,
    pub rules_dir: Option<String>,
    pub index: Option<String>,
    pub cross_file: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `falco-rules-tools.toml|yaml`.
pub struct ToolConfig {
    pub falco_image: Option<String>,
    pub falco_entrypoint: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub explorer: Option<ExplorerCfg>,
}

/// CLI-provided overrides; `None` falls back to the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides<'a> {
    pub root: Option<&'a str>,
    pub falco_image: Option<&'a str>,
    pub output: Option<&'a str>,
    pub explorer_registry: Option<&'a str>,
    pub rules_dir: Option<&'a str>,
    pub index: Option<&'a str>,
    pub cross_file: Option<bool>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    /// Whether a config file was found under `repo_root`.
    pub config_found: bool,
    pub falco_image: String,
    pub falco_entrypoint: String,
    pub output: String,
    pub explorer_registry: PathBuf,
    pub rules_dir: PathBuf,
    pub index: PathBuf,
    pub cross_file: bool,
}

fn config_candidates(root: &Path) -> [PathBuf; 3] {
    ["toml", "yaml", "yml"].map(|ext| root.join(format!("{}.{}", CONFIG_BASENAME, ext)))
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a config file or a `.git` directory is found. A relative
/// `start` is made absolute first so the walk can climb past it.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let start = std::path::absolute(start).unwrap_or_else(|_| start.to_path_buf());
    let mut cur = start.as_path();
    loop {
        if config_candidates(cur).iter().any(|p| p.exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start,
        }
    }
}

/// Load `ToolConfig` from the first config file present under `root`.
///
/// A file that exists but does not parse is an error.
pub fn load_config(root: &Path) -> Result<Option<ToolConfig>> {
    for path in config_candidates(root) {
        if !path.exists() {
            continue;
        }
        let s = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let cfg: ToolConfig = if path.extension().is_some_and(|e| e == "toml") {
            toml::from_str(&s)?
        } else {
            serde_yaml::from_str::<Option<ToolConfig>>(&s)?.unwrap_or_default()
        };
        return Ok(Some(cfg));
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
///
/// Explorer paths from the config file are relative to the repository
/// root; CLI paths are taken as given.
pub fn resolve_effective(cli: &Overrides) -> Result<Effective> {
    let start = PathBuf::from(cli.root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();
    let explorer = cfg.explorer.unwrap_or_default();

    let falco_image = cli
        .falco_image
        .map(|s| s.to_string())
        .or(cfg.falco_image)
        .unwrap_or_else(|| DEFAULT_IMAGE.to_string());
    let falco_entrypoint = cfg
        .falco_entrypoint
        .unwrap_or_else(|| DEFAULT_ENTRYPOINT.to_string());
    let output = cli
        .output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let path_setting = |flag: Option<&str>, file: Option<String>, default: &str| match flag {
        Some(p) => PathBuf::from(p),
        None => repo_root.join(file.as_deref().unwrap_or(default)),
    };
    let explorer_registry = path_setting(cli.explorer_registry, explorer.registry, "registry.yaml");
    let rules_dir = path_setting(cli.rules_dir, explorer.rules_dir, "rules");
    let index = path_setting(cli.index, explorer.index, "index.json");
    let cross_file = cli.cross_file.or(explorer.cross_file).unwrap_or(false);

    Ok(Effective {
        repo_root,
        config_found,
        falco_image,
        falco_entrypoint,
        output,
        explorer_registry,
        rules_dir,
        index,
        cross_file,
    })
}

/// Read a required environment variable.
pub fn require_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::MissingEnv(key.to_string())),
    }
}
