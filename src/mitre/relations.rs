//! Technique and tactic tags declared by each rule of a rules file.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value as Yaml;

/// Technique, sub-technique or tactic IDs such as `T1610`, `T1548.001`, `TA0001`.
static TECHNIQUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^TA?(\d+).(\d+)").expect("valid technique tag regex"));

const TACTIC_MARKER: &str = "MITRE_";

/// Item key every rules file declares.
const RULES_FILE_MARKER: &str = "required_engine_version";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MitreRelation {
    /// Upper-cased technique tags, in tag order.
    pub techniques: Vec<String>,
    /// Lower-cased `mitre_*` tactic tags, in tag order.
    pub tactics: Vec<String>,
}

/// Relations per rule name, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MitreRelations {
    pub rules: Vec<(String, MitreRelation)>,
}

impl MitreRelations {
    /// Add tags to `rule`, merging with an earlier item of the same name.
    pub fn add(&mut self, rule: &str, techniques: Vec<String>, tactics: Vec<String>) {
        match self.rules.iter_mut().find(|(name, _)| name == rule) {
            Some((_, rel)) => {
                rel.techniques.extend(techniques);
                rel.tactics.extend(tactics);
            }
            None => self
                .rules
                .push((rule.to_string(), MitreRelation { techniques, tactics })),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn tag_text(v: &Yaml) -> Option<String> {
    match v {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Split one rule's tags into technique and tactic tags.
pub fn classify_tags(tags: &[String]) -> MitreRelation {
    let upper: Vec<String> = tags.iter().map(|t| t.to_uppercase()).collect();
    MitreRelation {
        techniques: upper
            .iter()
            .filter(|t| TECHNIQUE_RE.is_match(t))
            .cloned()
            .collect(),
        tactics: upper
            .iter()
            .filter(|t| t.contains(TACTIC_MARKER))
            .map(|t| t.to_lowercase())
            .collect(),
    }
}

/// Collect MITRE relations from the rules of a rules file.
///
/// `source` must look like a rules file: a sequence with at least one
/// `required_engine_version` item. Items without `rule` or `tags` are ignored.
pub fn parse_relations(source: &str, origin: &str) -> Result<MitreRelations> {
    let not_rules = || {
        Error::Validation(format!(
            "missing '{}' conf in {}, so wrong falco rules file format or not a rules file",
            RULES_FILE_MARKER, origin
        ))
    };
    let items = match serde_yaml::from_str::<Yaml>(source)? {
        Yaml::Sequence(items) => items,
        _ => return Err(not_rules()),
    };
    if !items.iter().any(|i| i.get(RULES_FILE_MARKER).is_some()) {
        return Err(not_rules());
    }

    let mut relations = MitreRelations::default();
    for item in &items {
        let (Some(rule), Some(Yaml::Sequence(tags))) =
            (item.get("rule").and_then(tag_text), item.get("tags"))
        else {
            continue;
        };
        let tags: Vec<String> = tags.iter().filter_map(tag_text).collect();
        let rel = classify_tags(&tags);
        relations.add(&rule, rel.techniques, rel.tactics);
    }
    Ok(relations)
}
