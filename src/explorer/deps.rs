//! Textual cross references between rules, macros and lists.

use crate::models::entity::{EntityKind, RuleEntity};
use once_cell::sync::Lazy;
use regex::Regex;

/// Dotted field tokens such as `fd.num` or `proc.pname`.
static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z_]+\.)+[a-z_]+").expect("valid field regex"));

/// `condition` with field tokens removed.
pub fn strip_fields(condition: &str) -> String {
    FIELD_RE.replace_all(condition, "").into_owned()
}

struct Node {
    kind: Option<EntityKind>,
    name: String,
    hash: String,
    edge: String,
    stripped: String,
}

/// Fill `dependencies` and `used_by` for every entity of the collection.
///
/// Macros and rules depend on the lists and macros whose names occur in
/// their field-stripped condition; lists and macros are used by the macros
/// and rules that mention them. Entities sharing a hash never reference
/// each other.
pub fn find_dependencies(entities: &mut [RuleEntity]) {
    let nodes: Vec<Node> = entities
        .iter()
        .map(|e| Node {
            kind: e.kind,
            name: e.name.clone(),
            hash: e.hash.clone(),
            edge: e.edge_id(),
            stripped: strip_fields(&e.condition),
        })
        .collect();

    for (i, entity) in entities.iter_mut().enumerate() {
        let me = &nodes[i];
        let Some(kind) = me.kind else { continue };
        let mut deps = Vec::new();
        let mut used_by = Vec::new();

        for other in nodes.iter().filter(|o| o.hash != me.hash) {
            match (kind, other.kind) {
                (EntityKind::Macro | EntityKind::Rule, Some(EntityKind::List | EntityKind::Macro))
                    if me.stripped.contains(&other.name) =>
                {
                    deps.push(other.edge.clone());
                }
                _ => {}
            }
            match (kind, other.kind) {
                (EntityKind::Macro | EntityKind::List, Some(EntityKind::Macro | EntityKind::Rule))
                    if other.stripped.contains(&me.name) =>
                {
                    used_by.push(other.edge.clone());
                }
                _ => {}
            }
        }

        entity.dependencies.extend(deps);
        entity.used_by.extend(used_by);
    }
}
