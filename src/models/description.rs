//! Rule set description as emitted by the rules engine's `-L` listing.
//!
//! The shape mirrors the engine's JSON output: top-level engine/plugin
//! requirements, then `lists`, `macros` and `rules`, each carrying a
//! `details` block (compiled facts such as matched events) and an `info`
//! block (what the author wrote). Every field is optional on the wire;
//! missing values and explicit `null`s read as empty.

use serde::{Deserialize, Deserializer, Serialize};

fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
/// Full description of a loaded rule set.
pub struct RulesetDescription {
    #[serde(default, deserialize_with = "nullable")]
    pub required_engine_version: String,
    #[serde(default, deserialize_with = "nullable")]
    pub required_plugin_versions: Vec<PluginRequirementGroup>,
    #[serde(default, deserialize_with = "nullable")]
    pub lists: Vec<ListDescription>,
    #[serde(default, deserialize_with = "nullable")]
    pub macros: Vec<MacroDescription>,
    #[serde(default, deserialize_with = "nullable")]
    pub rules: Vec<RuleDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
/// A single `{name, version}` plugin requirement.
pub struct PluginRequirement {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
/// A plugin requirement plus the alternatives that satisfy it equally.
pub struct PluginRequirementGroup {
    #[serde(flatten)]
    pub primary: PluginRequirement,
    #[serde(default, deserialize_with = "nullable")]
    pub alternatives: Vec<PluginRequirement>,
}

impl PluginRequirementGroup {
    /// Requirement for `plugin` in this group, primary first.
    pub fn requirement_for(&self, plugin: &str) -> Option<&PluginRequirement> {
        if self.primary.name == plugin {
            return Some(&self.primary);
        }
        self.alternatives.iter().find(|a| a.name == plugin)
    }

    /// Primary requirement followed by every alternative.
    pub fn requirements(&self) -> impl Iterator<Item = &PluginRequirement> {
        std::iter::once(&self.primary).chain(self.alternatives.iter())
    }

    pub fn requirement_count(&self) -> usize {
        1 + self.alternatives.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ListDescription {
    #[serde(default, deserialize_with = "nullable")]
    pub details: ListDetails,
    #[serde(default, deserialize_with = "nullable")]
    pub info: ListInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ListDetails {
    #[serde(default, deserialize_with = "nullable")]
    pub lists: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ListInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MacroDescription {
    #[serde(default, deserialize_with = "nullable")]
    pub details: MacroDetails,
    #[serde(default, deserialize_with = "nullable")]
    pub info: MacroInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MacroDetails {
    #[serde(default, deserialize_with = "nullable")]
    pub condition_fields: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub events: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub lists: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub macros: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub operators: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MacroInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub condition: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RuleDescription {
    #[serde(default, deserialize_with = "nullable")]
    pub details: RuleDetails,
    #[serde(default, deserialize_with = "nullable")]
    pub info: RuleInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RuleDetails {
    #[serde(default, deserialize_with = "nullable")]
    pub condition_fields: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub events: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub exception_fields: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub exception_operators: Vec<String>,
    /// Names of the exceptions declared on the rule.
    #[serde(default, rename = "exceptions", deserialize_with = "nullable")]
    pub exception_names: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub lists: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub macros: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub operators: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub output_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RuleInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub condition: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub output: String,
    #[serde(default, deserialize_with = "nullable")]
    pub priority: String,
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
}

impl RulesetDescription {
    /// Group in this description that mentions `plugin` as primary or alternative.
    pub fn find_plugin_group(&self, plugin: &str) -> Option<&PluginRequirementGroup> {
        self.required_plugin_versions
            .iter()
            .find(|g| g.requirement_for(plugin).is_some())
    }

    pub fn list_names(&self) -> Vec<String> {
        self.lists.iter().map(|l| l.info.name.clone()).collect()
    }

    pub fn macro_names(&self) -> Vec<String> {
        self.macros.iter().map(|m| m.info.name.clone()).collect()
    }

    pub fn rule_names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.info.name.clone()).collect()
    }
}
