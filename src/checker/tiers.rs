//! Semantic-version classification of rule set changes.
//!
//! Each classifier compares a `left` (before) and `right` (after)
//! description and returns human-readable reasons. They are independent
//! and total: any pair of descriptions yields a (possibly empty) list.
//!
//! Rules, macros and lists are paired by exact name across the full
//! collections, so duplicate names are compared against every namesake.

use super::compare::{
    compare_engine_versions, compare_plugin_versions, compare_priorities, diff_str_set,
    sets_differ,
};
use crate::models::description::{PluginRequirementGroup, RulesetDescription};
use serde::Serialize;
use std::cmp::Ordering;

/// Reasons grouped by tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub major: Vec<String>,
    pub minor: Vec<String>,
    pub patch: Vec<String>,
}

impl ChangeReport {
    pub fn is_empty(&self) -> bool {
        self.major.is_empty() && self.minor.is_empty() && self.patch.is_empty()
    }

    /// Non-empty tiers in reporting order.
    pub fn tiers(&self) -> Vec<(&'static str, &[String])> {
        [
            ("Major", self.major.as_slice()),
            ("Minor", self.minor.as_slice()),
            ("Patch", self.patch.as_slice()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .collect()
    }
}

/// Run all three classifiers in order major, minor, patch.
pub fn compare(left: &RulesetDescription, right: &RulesetDescription) -> ChangeReport {
    ChangeReport {
        major: compare_major(left, right),
        minor: compare_minor(left, right),
        patch: compare_patch(left, right),
    }
}

/// First group of `right` with any requirement of `group` mentioned in `other`.
fn matching_group<'a>(
    group: &PluginRequirementGroup,
    other: &'a RulesetDescription,
) -> Option<&'a PluginRequirementGroup> {
    group
        .requirements()
        .find_map(|req| other.find_plugin_group(&req.name))
}

/// Version direction for every requirement of `left` still present in `right`.
fn plugin_version_moves<'a>(
    left: &'a RulesetDescription,
    right: &RulesetDescription,
) -> Vec<(&'a str, Ordering)> {
    let mut moves = Vec::new();
    for group in &left.required_plugin_versions {
        for lreq in group.requirements() {
            let Some(rreq) = right
                .find_plugin_group(&lreq.name)
                .and_then(|g| g.requirement_for(&lreq.name))
            else {
                continue;
            };
            if let Some(ord) = compare_plugin_versions(&lreq.version, &rreq.version) {
                moves.push((lreq.name.as_str(), ord));
            }
        }
    }
    moves
}

/// Breaking changes: `right` is less permissive or compatible than `left`.
pub fn compare_major(left: &RulesetDescription, right: &RulesetDescription) -> Vec<String> {
    let mut res = Vec::new();

    // removing a whole plugin block is not breaking, dropping an alternative is
    for group in &left.required_plugin_versions {
        let removed: Vec<String> = group
            .requirements()
            .filter(|req| {
                right.find_plugin_group(&req.name).is_none() && !group.alternatives.is_empty()
            })
            .map(|req| {
                format!(
                    "Version dependency alternative to plugin `{}` has removed",
                    req.name
                )
            })
            .collect();
        if removed.len() < group.requirement_count() {
            res.extend(removed);
        }
    }

    for name in diff_str_set(&left.rule_names(), &right.rule_names()) {
        res.push(format!("Rule `{}` has been removed", name));
    }
    for name in diff_str_set(&left.macro_names(), &right.macro_names()) {
        res.push(format!("Macro `{}` has been removed", name));
    }
    for name in diff_str_set(&left.list_names(), &right.list_names()) {
        res.push(format!("List `{}` has been removed", name));
    }

    for l in &left.rules {
        for r in right.rules.iter().filter(|r| r.info.name == l.info.name) {
            let name = &l.info.name;
            if l.info.source != r.info.source {
                res.push(format!(
                    "Rule `{}` has different source (before='{}', after='{}')",
                    name, l.info.source, r.info.source
                ));
            }
            if l.info.enabled && !r.info.enabled {
                res.push(format!("Rule `{}` has been disabled at default", name));
            }
            if !diff_str_set(&l.details.events, &r.details.events).is_empty() {
                res.push(format!("Rule `{}` matches less events than before", name));
            }
            if !diff_str_set(&l.info.tags, &r.info.tags).is_empty() {
                res.push(format!("Rule `{}` has less tags than before", name));
            }
            if compare_priorities(&l.info.priority, &r.info.priority) == Ordering::Greater {
                res.push(format!(
                    "Rule `{}` has a less urgent priority than before",
                    name
                ));
            }
        }
    }

    for l in &left.macros {
        for r in right.macros.iter().filter(|r| r.info.name == l.info.name) {
            if sets_differ(&l.details.events, &r.details.events) {
                res.push(format!(
                    "Macro `{}` matches different events than before",
                    l.info.name
                ));
            }
        }
    }

    res
}

/// Additive changes.
pub fn compare_minor(left: &RulesetDescription, right: &RulesetDescription) -> Vec<String> {
    let mut res = Vec::new();

    if compare_engine_versions(&left.required_engine_version, &right.required_engine_version)
        == Ordering::Less
    {
        res.push(format!(
            "Required engine version was incremented from {} to {}",
            left.required_engine_version, right.required_engine_version
        ));
    }

    for group in &right.required_plugin_versions {
        if matching_group(group, left).is_none() {
            res.push(format!(
                "Version dependency to plugin `{}` has added",
                group.primary.name
            ));
        }
    }

    for (name, ord) in plugin_version_moves(left, right) {
        if ord == Ordering::Less {
            res.push(format!(
                "Version dependency to plugin `{}` has been incremented",
                name
            ));
        }
    }

    for name in diff_str_set(&right.rule_names(), &left.rule_names()) {
        res.push(format!("Rule `{}` has been added", name));
    }
    for name in diff_str_set(&right.macro_names(), &left.macro_names()) {
        res.push(format!("Macro `{}` has been added", name));
    }
    for name in diff_str_set(&right.list_names(), &left.list_names()) {
        res.push(format!("List `{}` has been added", name));
    }

    res
}

/// Non-breaking refinements.
pub fn compare_patch(left: &RulesetDescription, right: &RulesetDescription) -> Vec<String> {
    let mut res = Vec::new();

    if compare_engine_versions(&left.required_engine_version, &right.required_engine_version)
        == Ordering::Greater
    {
        res.push(format!(
            "Required engine version was decremented from {} to {}",
            left.required_engine_version, right.required_engine_version
        ));
    }

    // a dependency counts as removed only when no requirement of its group survives
    for group in &left.required_plugin_versions {
        let removed: Vec<String> = group
            .requirements()
            .filter(|req| right.find_plugin_group(&req.name).is_none())
            .map(|req| format!("Version dependency to plugin `{}` has removed", req.name))
            .collect();
        if removed.len() == group.requirement_count() {
            res.extend(removed);
        }
    }

    for (name, ord) in plugin_version_moves(left, right) {
        if ord == Ordering::Greater {
            res.push(format!(
                "Version dependency to plugin `{}` has been decremented",
                name
            ));
        }
    }

    for group in &right.required_plugin_versions {
        if let Some(existing) = matching_group(group, left) {
            for req in group.requirements() {
                if existing.requirement_for(&req.name).is_none() {
                    res.push(format!(
                        "Version dependency alternative to plugin `{}` has added",
                        req.name
                    ));
                }
            }
        }
    }

    for l in &left.rules {
        for r in right.rules.iter().filter(|r| r.info.name == l.info.name) {
            let name = &l.info.name;
            if !l.info.enabled && r.info.enabled {
                res.push(format!("Rule `{}` has been enabled at default", name));
            }
            if !diff_str_set(&r.details.events, &l.details.events).is_empty() {
                res.push(format!("Rule `{}` matches more events than before", name));
            }
            if l.details.output_fields.len() != r.details.output_fields.len() {
                res.push(format!("Rule `{}` changed its output fields", name));
            }
            if !diff_str_set(&r.info.tags, &l.info.tags).is_empty() {
                res.push(format!("Rule `{}` has more tags than before", name));
            }
            if compare_priorities(&r.info.priority, &l.info.priority) == Ordering::Greater {
                res.push(format!(
                    "Rule `{}` has a more urgent priority than before",
                    name
                ));
            }
            if sets_differ(&l.details.exception_names, &r.details.exception_names) {
                res.push(format!(
                    "Rule `{}` has some exceptions added or removed",
                    name
                ));
            }
        }
    }

    for l in &left.lists {
        for r in right.lists.iter().filter(|r| r.info.name == l.info.name) {
            if sets_differ(&l.info.items, &r.info.items) {
                res.push(format!(
                    "List `{}` has some item added or removed",
                    l.info.name
                ));
            }
        }
    }

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::description::{
        ListDescription, MacroDescription, PluginRequirement, PluginRequirementGroup,
        RuleDescription,
    };

    const SAMPLE: &str = r#"{
        "lists": [
            {"details": {"lists": []}, "info": {"items": ["ash", "bash"], "name": "list1"}}
        ],
        "macros": [
            {
                "details": {
                    "condition_fields": ["fd.num", "evt.type"],
                    "events": ["openat2", "openat", "open"],
                    "lists": [], "macros": [], "operators": [">=", "=", "in"]
                },
                "info": {"name": "macro1"}
            }
        ],
        "required_engine_version": "13",
        "required_plugin_versions": [
            {
                "alternatives": [{"name": "k8saudit-eks", "version": "0.2.0"}],
                "name": "k8saudit",
                "version": "0.6.0"
            },
            {"name": "json", "version": "0.7.0"}
        ],
        "rules": [
            {
                "details": {
                    "condition_fields": [],
                    "events": ["execve", "openat"],
                    "exceptions": [],
                    "exception_fields": [],
                    "exception_operators": [],
                    "lists": [], "macros": [], "operators": [],
                    "output_fields": ["user.name", "container.id"]
                },
                "info": {
                    "enabled": false,
                    "name": "rule1",
                    "priority": "Notice",
                    "source": "syscall",
                    "tags": ["container", "network"]
                }
            }
        ]
    }"#;

    fn sample() -> RulesetDescription {
        serde_json::from_str(SAMPLE).unwrap()
    }

    fn named_rule(name: &str) -> RuleDescription {
        let mut r = RuleDescription::default();
        r.info.name = name.into();
        r
    }

    #[test]
    fn test_identical_descriptions_report_nothing() {
        let report = compare(&sample(), &sample());
        assert!(report.is_empty());
        assert!(report.tiers().is_empty());
    }

    #[test]
    fn test_patch_decrement_engine_version() {
        let mut o2 = sample();
        o2.required_engine_version = "0".into();
        let report = compare(&sample(), &o2);
        assert_eq!(report.patch.len(), 1);
        assert!(report.major.is_empty());
        assert!(report.minor.is_empty());
        assert_eq!(
            report.patch[0],
            "Required engine version was decremented from 13 to 0"
        );
    }

    #[test]
    fn test_patch_remove_plugin_group_with_alternatives() {
        let mut o2 = sample();
        o2.required_plugin_versions.remove(0);
        let res = compare_patch(&sample(), &o2);
        assert_eq!(res.len(), 2);
        assert!(res[0].contains("`k8saudit`"));
        assert!(res[1].contains("`k8saudit-eks`"));
        // whole-block removal is not breaking
        assert!(compare_major(&sample(), &o2).is_empty());
    }

    #[test]
    fn test_patch_remove_plugin_group_without_alternatives() {
        let mut o2 = sample();
        o2.required_plugin_versions.truncate(1);
        let res = compare_patch(&sample(), &o2);
        assert_eq!(res, vec!["Version dependency to plugin `json` has removed"]);
        assert!(compare_major(&sample(), &o2).is_empty());
    }

    #[test]
    fn test_patch_add_plugin_alternative() {
        let mut o2 = sample();
        o2.required_plugin_versions[1]
            .alternatives
            .push(PluginRequirement {
                name: "json2".into(),
                version: "0.1.0".into(),
            });
        let res = compare_patch(&sample(), &o2);
        assert_eq!(
            res,
            vec!["Version dependency alternative to plugin `json2` has added"]
        );
    }

    #[test]
    fn test_patch_decrement_plugin_version() {
        let mut o2 = sample();
        o2.required_plugin_versions[0].primary.version = "0.5.0".into();
        let res = compare_patch(&sample(), &o2);
        assert_eq!(
            res,
            vec!["Version dependency to plugin `k8saudit` has been decremented"]
        );
    }

    #[test]
    fn test_patch_list_items() {
        let mut o2 = sample();
        o2.lists[0].info.items.push("some_value".into());
        assert_eq!(compare_patch(&sample(), &o2).len(), 1);

        let mut o2 = sample();
        o2.lists[0].info.items.clear();
        assert_eq!(compare_patch(&sample(), &o2).len(), 1);
    }

    #[test]
    fn test_patch_rule_changes() {
        let mut o1 = sample();
        let mut o2 = sample();
        o1.rules[0].info.enabled = false;
        o2.rules[0].info.enabled = true;
        assert_eq!(compare_patch(&o1, &o2).len(), 1);

        let mut o2 = sample();
        o2.rules[0].details.events.push("pluginevent".into());
        assert_eq!(compare_patch(&sample(), &o2).len(), 1);

        let mut o2 = sample();
        o2.rules[0].info.tags.push("some_other_tag".into());
        assert_eq!(compare_patch(&sample(), &o2).len(), 1);

        let mut o2 = sample();
        o2.rules[0].details.output_fields.clear();
        assert_eq!(compare_patch(&sample(), &o2).len(), 1);

        let mut o2 = sample();
        o2.rules[0].details.output_fields.push("some.otherfield".into());
        assert_eq!(compare_patch(&sample(), &o2).len(), 1);

        let mut o1 = sample();
        let mut o2 = sample();
        o1.rules[0].info.priority = "DEBUG".into();
        o2.rules[0].info.priority = "INFO".into();
        assert_eq!(
            compare_patch(&o1, &o2),
            vec!["Rule `rule1` has a more urgent priority than before"]
        );
    }

    #[test]
    fn test_patch_exceptions() {
        let mut o2 = sample();
        o2.rules[0]
            .details
            .exception_names
            .push("some-exception-name".into());
        assert_eq!(compare_patch(&sample(), &o2).len(), 1);

        let mut o1 = sample();
        let mut o2 = sample();
        o1.rules[0]
            .details
            .exception_names
            .push("exception1, exception2".into());
        o2.rules[0].details.exception_names.push("exception1".into());
        assert_eq!(compare_patch(&o1, &o2).len(), 1);
    }

    #[test]
    fn test_minor_changes() {
        let mut o2 = sample();
        o2.required_engine_version = "100".into();
        let report = compare(&sample(), &o2);
        assert_eq!(report.minor.len(), 1);
        assert!(report.patch.is_empty());

        let mut o2 = sample();
        o2.required_plugin_versions.push(PluginRequirementGroup {
            primary: PluginRequirement {
                name: "some_other_plugin".into(),
                version: "0.1.0".into(),
            },
            alternatives: vec![],
        });
        assert_eq!(
            compare_minor(&sample(), &o2),
            vec!["Version dependency to plugin `some_other_plugin` has added"]
        );

        let mut o2 = sample();
        o2.required_plugin_versions[0].alternatives[0].version = "10.0.0".into();
        assert_eq!(
            compare_minor(&sample(), &o2),
            vec!["Version dependency to plugin `k8saudit-eks` has been incremented"]
        );

        let mut o2 = sample();
        o2.required_plugin_versions[1].primary.version = "10.0.0".into();
        assert_eq!(compare_minor(&sample(), &o2).len(), 1);
    }

    #[test]
    fn test_minor_additions() {
        let mut l = ListDescription::default();
        l.info.name = "l2".into();
        let mut m = MacroDescription::default();
        m.info.name = "m2".into();

        let mut o2 = sample();
        o2.lists.push(l.clone());
        assert_eq!(compare_minor(&sample(), &o2), vec!["List `l2` has been added"]);

        let mut o2 = sample();
        o2.lists.push(l);
        o2.macros.push(m);
        o2.rules.push(named_rule("r2"));
        assert_eq!(compare_minor(&sample(), &o2).len(), 3);
    }

    #[test]
    fn test_major_remove_plugin_alternative() {
        let mut o2 = sample();
        o2.required_plugin_versions[0].alternatives.clear();
        assert_eq!(
            compare_major(&sample(), &o2),
            vec!["Version dependency alternative to plugin `k8saudit-eks` has removed"]
        );
    }

    #[test]
    fn test_major_removals() {
        let mut o2 = sample();
        o2.lists.clear();
        assert_eq!(compare_major(&sample(), &o2), vec!["List `list1` has been removed"]);

        let mut o2 = sample();
        o2.macros.clear();
        assert_eq!(compare_major(&sample(), &o2).len(), 1);

        let mut o2 = sample();
        o2.rules.clear();
        assert_eq!(compare_major(&sample(), &o2).len(), 1);

        let mut o2 = sample();
        o2.lists.clear();
        o2.macros.clear();
        o2.rules.clear();
        assert_eq!(compare_major(&sample(), &o2).len(), 3);
    }

    #[test]
    fn test_major_macro_events() {
        let mut o2 = sample();
        o2.macros[0].details.events.push("pluginevent".into());
        assert_eq!(compare_major(&sample(), &o2).len(), 1);

        let mut o2 = sample();
        o2.macros[0].details.events.clear();
        assert_eq!(compare_major(&sample(), &o2).len(), 1);
    }

    #[test]
    fn test_major_rule_changes() {
        let mut o2 = sample();
        o2.rules[0].info.source = "some_other_source".into();
        assert_eq!(
            compare_major(&sample(), &o2),
            vec!["Rule `rule1` has different source (before='syscall', after='some_other_source')"]
        );

        let mut o1 = sample();
        let mut o2 = sample();
        o1.rules[0].info.enabled = true;
        o2.rules[0].info.enabled = false;
        assert_eq!(compare_major(&o1, &o2).len(), 1);

        let mut o2 = sample();
        o2.rules[0].details.events.clear();
        assert_eq!(compare_major(&sample(), &o2).len(), 1);

        let mut o2 = sample();
        o2.rules[0].info.tags.clear();
        assert_eq!(compare_major(&sample(), &o2).len(), 1);

        let mut o1 = sample();
        let mut o2 = sample();
        o1.rules[0].info.priority = "INFO".into();
        o2.rules[0].info.priority = "DEBUG".into();
        assert_eq!(compare_major(&o1, &o2).len(), 1);
    }

    #[test]
    fn test_enable_rule_end_to_end() {
        let mut o2 = sample();
        o2.rules[0].info.enabled = true;
        let report = compare(&sample(), &o2);
        assert_eq!(
            report,
            ChangeReport {
                major: vec![],
                minor: vec![],
                patch: vec!["Rule `rule1` has been enabled at default".into()],
            }
        );
    }

    #[test]
    fn test_duplicate_names_compare_every_pair() {
        let mut o1 = sample();
        o1.rules.push(o1.rules[0].clone());
        let mut o2 = o1.clone();
        o2.rules[0].info.enabled = true;
        o2.rules[1].info.enabled = true;
        // two left copies, each paired with two right copies
        assert_eq!(compare_patch(&o1, &o2).len(), 4);
    }
}
