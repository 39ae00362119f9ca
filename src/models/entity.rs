//! Rules-file entities scraped by the explorer.
//!
//! An entity is one item of a rules file: a `rule`, a `macro` or a `list`.
//! It is read from YAML, enriched by the explorer stages and serialized
//! into the explorer index.

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value as Yaml;
use std::fmt;

/// Kind of a rules-file entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Rule,
    Macro,
    List,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Rule => "rule",
            EntityKind::Macro => "macro",
            EntityKind::List => "list",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read any YAML scalar (bool, number, string) as its string form.
fn scalar_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Yaml>::deserialize(d)? {
        None | Some(Yaml::Null) => String::new(),
        Some(Yaml::Bool(b)) => b.to_string(),
        Some(Yaml::Number(n)) => n.to_string(),
        Some(Yaml::String(s)) => s,
        Some(_) => String::new(),
    })
}

fn string_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Yaml>>::deserialize(d)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            Yaml::String(s) => Some(s),
            Yaml::Bool(b) => Some(b.to_string()),
            Yaml::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
/// Plugin requirement as declared in a rules file.
pub struct PluginVersion {
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
/// One item of a rules file plus everything the explorer derives for it.
pub struct RuleEntity {
    #[serde(skip)]
    pub first_line: usize,
    #[serde(skip)]
    pub last_line: usize,
    #[serde(skip_deserializing, skip_serializing_if = "String::is_empty")]
    pub file_name: String,
    #[serde(skip_deserializing)]
    pub comment: String,
    #[serde(skip_deserializing, skip_serializing_if = "String::is_empty")]
    pub permalink: String,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub required_engine_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_plugin_versions: Vec<PluginVersion>,
    #[serde(skip_deserializing, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub rule: String,
    #[serde(rename = "macro", default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub macro_name: String,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub list: String,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub condition: String,
    #[serde(default, deserialize_with = "string_list", skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub priority: String,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub enabled: String,
    #[serde(skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    pub used_by: Vec<String>,
    #[serde(rename = "type", skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntityKind>,
    #[serde(skip_deserializing, skip_serializing_if = "String::is_empty")]
    pub hash: String,
}

impl RuleEntity {
    /// Kind and defining value, macro first, then rule, then list.
    pub fn defining_field(&self) -> Option<(EntityKind, &str)> {
        if !self.macro_name.is_empty() {
            Some((EntityKind::Macro, &self.macro_name))
        } else if !self.rule.is_empty() {
            Some((EntityKind::Rule, &self.rule))
        } else if !self.list.is_empty() {
            Some((EntityKind::List, &self.list))
        } else {
            None
        }
    }

    /// Edge identifier `"<kind>:<name>:<hash>"` pointing at this entity.
    pub fn edge_id(&self) -> String {
        let kind = self.kind.map(EntityKind::as_str).unwrap_or_default();
        format!("{}:{}:{}", kind, self.name, self.hash)
    }
}
