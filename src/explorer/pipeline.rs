//! Per-file normalization stages, applied in order by [`scrape`].

use super::outline::{outline, OutlineItem};
use crate::error::Result;
use crate::models::entity::RuleEntity;
use sha2::{Digest, Sha256};

/// Default source for rules that do not declare one.
pub const DEFAULT_RULE_SOURCE: &str = "syscalls";

/// Hex SHA-256 digest of `text`.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Set kind, name and hash from the defining field.
pub fn assign_identity(entities: Vec<RuleEntity>) -> Vec<RuleEntity> {
    entities
        .into_iter()
        .map(|mut e| {
            if let Some((kind, value)) = e.defining_field() {
                let (name, hash) = (value.to_string(), content_hash(value));
                e.kind = Some(kind);
                e.name = name;
                e.hash = hash;
            }
            e
        })
        .collect()
}

pub fn default_enabled(entities: Vec<RuleEntity>) -> Vec<RuleEntity> {
    entities
        .into_iter()
        .map(|mut e| {
            if e.enabled.is_empty() {
                e.enabled = "true".to_string();
            }
            e
        })
        .collect()
}

/// Copy the file's engine version requirement onto every entity.
///
/// When several items declare one, the last declaration wins.
pub fn propagate_engine_version(entities: Vec<RuleEntity>) -> Vec<RuleEntity> {
    let Some(version) = entities
        .iter()
        .rev()
        .find(|e| !e.required_engine_version.is_empty())
        .map(|e| e.required_engine_version.clone())
    else {
        return entities;
    };
    entities
        .into_iter()
        .map(|mut e| {
            e.required_engine_version = version.clone();
            e
        })
        .collect()
}

/// Copy the file's plugin requirements onto every entity, last declaration wins.
pub fn propagate_plugin_versions(entities: Vec<RuleEntity>) -> Vec<RuleEntity> {
    let Some(plugins) = entities
        .iter()
        .rev()
        .find(|e| !e.required_plugin_versions.is_empty())
        .map(|e| e.required_plugin_versions.clone())
    else {
        return entities;
    };
    entities
        .into_iter()
        .map(|mut e| {
            e.required_plugin_versions = plugins.clone();
            e
        })
        .collect()
}

/// Final path segment of a rules file URL or path.
pub fn file_name(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

/// Set file name, line span and permalink from the outline.
///
/// An entity whose `- kind: name` item is not found keeps lines `0`.
pub fn locate(entities: Vec<RuleEntity>, entry: &str, items: &[OutlineItem]) -> Vec<RuleEntity> {
    entities
        .into_iter()
        .map(|mut e| {
            let Some(kind) = e.kind else { return e };
            if let Some(item) = items
                .iter()
                .find(|i| i.key == kind.as_str() && i.value == e.name)
            {
                e.first_line = item.first_line;
                e.last_line = item.last_line;
            }
            e.file_name = file_name(entry).to_string();
            e.permalink = format!("{}#L{},L{}", entry, e.first_line, e.last_line);
            e
        })
        .collect()
}

/// Attach the head comment of the item starting at each entity's first line.
pub fn attach_comments(entities: Vec<RuleEntity>, items: &[OutlineItem]) -> Vec<RuleEntity> {
    entities
        .into_iter()
        .map(|mut e| {
            if let Some(item) = items
                .iter()
                .find(|i| i.first_line == e.first_line && !i.head_comment.is_empty())
            {
                e.comment = item.head_comment.clone();
            }
            e
        })
        .collect()
}

/// Drop nameless items and default rule sources.
pub fn finalize(entities: Vec<RuleEntity>) -> Vec<RuleEntity> {
    entities
        .into_iter()
        .filter(|e| e.defining_field().is_some())
        .map(|mut e| {
            if !e.rule.is_empty() && e.macro_name.is_empty() && e.source.is_empty() {
                e.source = DEFAULT_RULE_SOURCE.to_string();
            }
            e
        })
        .collect()
}

/// Parse one rules file and run every stage over its entities.
///
/// `entry` is the registry entry the file came from; it prefixes permalinks.
pub fn scrape(entry: &str, source: &str) -> Result<Vec<RuleEntity>> {
    let parsed: Option<Vec<Option<RuleEntity>>> = serde_yaml::from_str(source)?;
    let entities: Vec<RuleEntity> = parsed.unwrap_or_default().into_iter().flatten().collect();
    let items = outline(source);

    let entities = assign_identity(entities);
    let entities = default_enabled(entities);
    let entities = propagate_engine_version(entities);
    let entities = propagate_plugin_versions(entities);
    let entities = locate(entities, entry, &items);
    let entities = attach_comments(entities, &items);
    Ok(finalize(entities))
}
