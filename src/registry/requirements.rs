//! Engine version requirement declared by a rules file.

use crate::error::{Error, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const RULES_ENGINE_ANCHOR: &str = "- required_engine_version";
pub const ENGINE_VERSION_KEY: &str = "engine_version";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArtifactRequirement {
    pub name: String,
    pub version: String,
}

/// Engine version as semver; a bare integer `n` is the implicit `0.n.0`.
pub fn parse_requirement_version(raw: &str) -> Result<Version> {
    let raw = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    match Version::parse(raw) {
        Ok(v) => Ok(v),
        Err(source) => raw
            .parse::<u64>()
            .map(|minor| Version::new(0, minor, 0))
            .map_err(|_| Error::InvalidVersion {
                value: raw.to_string(),
                source,
            }),
    }
}

/// Scan `path` for its `- required_engine_version` line.
///
/// Only the first matching line counts. A file without one yields
/// [`Error::RequirementsNotFound`].
pub fn rulesfile_requirement(path: &Path) -> Result<ArtifactRequirement> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::io(path, e))?;
        if !line.starts_with(RULES_ENGINE_ANCHOR) {
            continue;
        }
        let value = line.split_once(':').map(|(_, v)| v).unwrap_or_default();
        let version = parse_requirement_version(value)?;
        return Ok(ArtifactRequirement {
            name: ENGINE_VERSION_KEY.to_string(),
            version: version.to_string(),
        });
    }
    Err(Error::RequirementsNotFound(path.to_path_buf()))
}
