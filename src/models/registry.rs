//! Rules-file catalog (`registry.yaml`) used for packaging and indexing.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]+[a-z0-9_-]*$").expect("valid rulesfile name regex"));

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Maintainer {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
/// One catalog entry describing a published rules file.
pub struct Rulesfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub reserved: bool,
    #[serde(default)]
    pub archived: bool,
    /// Signature block, passed through to the index untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
/// Top-level catalog.
pub struct Registry {
    #[serde(default)]
    pub rulesfiles: Vec<Rulesfile>,
}

impl Registry {
    /// Load a catalog from a YAML file.
    pub fn load(path: &Path) -> Result<Registry> {
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Check naming convention and uniqueness; the first offender is reported.
    pub fn validate(&self) -> Result<()> {
        let mut names: HashSet<&str> = HashSet::new();
        for rf in &self.rulesfiles {
            if !NAME_RE.is_match(&rf.name) {
                return Err(Error::Validation(format!(
                    "rulesfile name does follow the naming convention: '{}'",
                    rf.name
                )));
            }
            if !names.insert(rf.name.as_str()) {
                return Err(Error::Validation(format!(
                    "rulesfile name is not unique: '{}'",
                    rf.name
                )));
            }
        }
        Ok(())
    }

    /// Active (neither reserved nor archived) rulesfile called `name`.
    pub fn rulesfile_by_name(&self, name: &str) -> Option<&Rulesfile> {
        self.rulesfiles
            .iter()
            .filter(|rf| !rf.reserved && !rf.archived)
            .find(|rf| rf.name == name)
    }
}
