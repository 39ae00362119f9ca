//! Rules explorer: scrape rules files into a browsable JSON index.
//!
//! Each registry entry names a rules file by URL; its content is read from
//! the local rules directory under the entry's file name. Files are
//! scraped in parallel, then dependency edges are computed either within
//! each file or across all of them.

pub mod deps;
pub mod outline;
pub mod pipeline;

use crate::error::{Error, Result};
use crate::models::entity::RuleEntity;
use rayon::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Explorer registry: the rules files to index.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExplorerRegistry {
    #[serde(default)]
    pub rules_files: Vec<String>,
}

impl ExplorerRegistry {
    pub fn load(path: &Path) -> Result<ExplorerRegistry> {
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let reg: Option<ExplorerRegistry> = serde_yaml::from_str(&raw)?;
        Ok(reg.unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct ExploreOptions {
    pub registry: PathBuf,
    pub rules_dir: PathBuf,
    pub index: PathBuf,
    /// Resolve references across files instead of within each file.
    pub cross_file: bool,
}

/// Raw download URL for a GitHub `blob` link.
pub fn raw_url(entry: &str) -> String {
    entry
        .replace("github.com", "raw.githubusercontent.com")
        .replace("blob/", "")
}

/// Read and scrape the local copy of one registry entry.
pub fn scrape_file(entry: &str, rules_dir: &Path) -> Result<Vec<RuleEntity>> {
    let path = rules_dir.join(pipeline::file_name(entry));
    if !path.is_file() {
        return Err(Error::NotFound(format!(
            "rules file {} not found (download it from {})",
            path.display(),
            raw_url(entry)
        )));
    }
    info!(file = %entry, "scraping rules file");
    let source = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
    pipeline::scrape(entry, &source)
}

/// Scrape every registry entry and link the resulting entities.
///
/// The first failing file aborts the run. Entities keep registry order.
pub fn explore(
    registry: &ExplorerRegistry,
    rules_dir: &Path,
    cross_file: bool,
) -> Result<Vec<RuleEntity>> {
    let per_file: Vec<Vec<RuleEntity>> = registry
        .rules_files
        .par_iter()
        .map(|entry| -> Result<Vec<RuleEntity>> {
            let mut entities = scrape_file(entry, rules_dir)?;
            if !cross_file {
                deps::find_dependencies(&mut entities);
            }
            info!(file = %entry, entities = entities.len(), "rules file scraped");
            Ok(entities)
        })
        .collect::<Result<_>>()?;

    let mut all: Vec<RuleEntity> = per_file.into_iter().flatten().collect();
    if cross_file {
        deps::find_dependencies(&mut all);
    }
    Ok(all)
}

pub fn write_index(path: &Path, entities: &[RuleEntity]) -> Result<()> {
    let raw = serde_json::to_string(entities)?;
    fs::write(path, raw).map_err(|e| Error::io(path, e))
}

/// Run the whole explorer and write the index; returns the entity count.
pub fn run(opts: &ExploreOptions) -> Result<usize> {
    let registry = ExplorerRegistry::load(&opts.registry)?;
    let entities = explore(&registry, &opts.rules_dir, opts.cross_file)?;
    info!(index = %opts.index.display(), entities = entities.len(), "writing explorer index");
    write_index(&opts.index, &entities)?;
    Ok(entities.len())
}
