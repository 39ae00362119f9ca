//! Distribution index: the YAML list of artifacts consumers discover.

use crate::error::{Error, Result};
use crate::models::registry::{Maintainer, Registry, Rulesfile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const RULESFILE_TYPE: &str = "rulesfile";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct IndexEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub registry: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub home: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<serde_yaml::Value>,
}

impl IndexEntry {
    pub fn from_rulesfile(rf: &Rulesfile, registry: &str, repository: &str) -> Self {
        let mut keywords = rf.keywords.clone();
        keywords.push(rf.name.clone());
        IndexEntry {
            name: rf.name.clone(),
            kind: RULESFILE_TYPE.to_string(),
            registry: registry.to_string(),
            repository: repository.to_string(),
            description: rf.description.clone(),
            home: rf.url.clone(),
            keywords,
            license: rf.license.clone(),
            maintainers: rf.maintainers.clone(),
            sources: vec![rf.url.clone()],
            signature: rf.signature.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    pub entries: Vec<IndexEntry>,
}

impl Index {
    /// Read an index file; a missing file is an empty index.
    pub fn read(path: &Path) -> Result<Index> {
        if !path.exists() {
            return Ok(Index::default());
        }
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let entries: Option<Vec<IndexEntry>> = serde_yaml::from_str(&raw)?;
        Ok(Index {
            entries: entries.unwrap_or_default(),
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let raw = serde_yaml::to_string(&self.entries)?;
        fs::write(path, raw).map_err(|e| Error::io(path, e))
    }

    /// Replace the entry with the same name, or append.
    pub fn upsert(&mut self, entry: IndexEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }
}

/// Split `host/path/to/repo` into registry host and repository path.
fn split_reference(reference: &str) -> (&str, &str) {
    reference.split_once('/').unwrap_or((reference, ""))
}

/// Add or refresh entries for every rulesfile published as an OCI artifact.
///
/// `oci_artifacts` maps rulesfile names to their repository reference.
pub fn upsert_index(
    registry: &Registry,
    oci_artifacts: &BTreeMap<String, String>,
    index: &mut Index,
) {
    for rf in &registry.rulesfiles {
        let Some(reference) = oci_artifacts.get(&rf.name) else {
            continue;
        };
        let (host, repo) = split_reference(reference);
        debug!(rulesfile = %rf.name, %host, %repo, "upserting index entry");
        index.upsert(IndexEntry::from_rulesfile(rf, host, repo));
    }
}

pub fn upsert_index_file(
    registry: &Registry,
    oci_artifacts: &BTreeMap<String, String>,
    path: &Path,
) -> Result<()> {
    let mut index = Index::read(path)?;
    upsert_index(registry, oci_artifacts, &mut index);
    index.write(path)
}
