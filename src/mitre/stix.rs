//! MITRE ATT&CK STIX 2 bundle, reduced to what tag checking needs.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// STIX object types that can be referenced from a rule tag.
const TAGGABLE_TYPES: [&str; 2] = ["x-mitre-tactic", "attack-pattern"];

/// Source name of ATT&CK's own external references.
pub const ATTACK_SOURCE: &str = "mitre-attack";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalReference {
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KillChainPhase {
    #[serde(default)]
    pub kill_chain_name: String,
    #[serde(default)]
    pub phase_name: String,
}

/// A technique, sub-technique or tactic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StixObject {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub external_references: Vec<ExternalReference>,
    #[serde(default)]
    pub kill_chain_phases: Option<Vec<KillChainPhase>>,
    #[serde(default)]
    pub x_mitre_shortname: Option<String>,
    #[serde(default)]
    pub x_mitre_deprecated: bool,
    #[serde(default)]
    pub revoked: bool,
}

impl StixObject {
    fn has_external_id(&self, id: &str) -> bool {
        self.external_references
            .iter()
            .any(|r| r.external_id.as_deref() == Some(id))
    }

    /// Tactic (phase) names: the kill chain phases of a technique, or the
    /// short name of a tactic.
    pub fn tactic_names(&self) -> Vec<String> {
        match &self.kill_chain_phases {
            Some(phases) => phases.iter().map(|p| p.phase_name.clone()).collect(),
            None => self.x_mitre_shortname.iter().cloned().collect(),
        }
    }

    /// URL of the ATT&CK reference, empty when missing.
    pub fn attack_url(&self) -> String {
        self.external_references
            .iter()
            .find(|r| r.source_name == ATTACK_SOURCE)
            .and_then(|r| r.url.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StixBundle {
    #[serde(default)]
    pub objects: Vec<StixObject>,
}

impl StixBundle {
    /// Read a bundle such as `enterprise-attack.json` from the MITRE CTI repository.
    pub fn load(path: &Path) -> Result<StixBundle> {
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Tactic or technique with the given ATT&CK ID.
    ///
    /// Deprecated and revoked objects are never returned.
    pub fn find(&self, external_id: &str) -> Option<&StixObject> {
        self.objects.iter().find(|o| {
            TAGGABLE_TYPES.contains(&o.kind.as_str())
                && !o.x_mitre_deprecated
                && !o.revoked
                && o.has_external_id(external_id)
        })
    }
}
