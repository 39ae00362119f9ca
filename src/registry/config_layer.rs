//! OCI artifact configuration layer for a packaged rules file.

use super::requirements::{rulesfile_requirement, ArtifactRequirement};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArtifactDependency {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<ArtifactRequirement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArtifactConfig {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ArtifactDependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<ArtifactRequirement>,
}

impl ArtifactConfig {
    /// Add a requirement, replacing any with the same name.
    pub fn set_requirement(&mut self, name: &str, version: &str) {
        let req = ArtifactRequirement {
            name: name.to_string(),
            version: version.to_string(),
        };
        match self.requirements.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = req,
            None => self.requirements.push(req),
        }
    }
}

/// Configuration layer for the rules file at `path`.
pub fn rulesfile_config(name: &str, version: &str, path: &Path) -> Result<ArtifactConfig> {
    let mut cfg = ArtifactConfig {
        name: name.to_string(),
        version: version.to_string(),
        ..Default::default()
    };

    match rulesfile_requirement(path) {
        Ok(req) => cfg.set_requirement(&req.name, &req.version),
        Err(Error::RequirementsNotFound(_)) => {}
        Err(e) => return Err(e),
    }

    if cfg.requirements.is_empty() {
        return Err(Error::Validation(format!(
            "no dependencies or requirements found for rulesfile {:?}",
            path.display().to_string()
        )));
    }
    Ok(cfg)
}
