//! MITRE ATT&CK tag checking for rules files.
//!
//! Each rule's technique tags (`T1610`, `T1548.001`, `TA0001`) are looked up
//! in a local STIX bundle. A rule must carry a `mitre_<tactic>` tag for every
//! tactic its techniques belong to, and no more tactic tags than those.

pub mod relations;
pub mod stix;

use crate::error::{Error, Result};
use relations::MitreRelations;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use stix::StixBundle;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorReason {
    #[serde(rename = "One or more tactics tags are missing")]
    Missing,
    #[serde(rename = "Too many tactics tags")]
    Overdo,
}

/// One tagging problem in one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitreError {
    pub rule: String,
    pub tactics_tags: Vec<String>,
    pub techniques_tags: Vec<String>,
    pub mitre_tactics_names: Vec<String>,
    pub mitre_techniques_names: Vec<String>,
    pub mitre_techniques_urls: Vec<String>,
    pub reasons: Vec<ErrorReason>,
}

/// On-disk shape of a `<stem>_mitre_errors.json` report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorsReport {
    pub errors: Vec<MitreError>,
}

/// Result of checking one rules file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: PathBuf,
    pub report_path: PathBuf,
    pub errors: Vec<MitreError>,
}

fn tactic_tag(tactic: &str) -> String {
    format!("mitre_{}", tactic.replace('-', "_"))
}

/// Check every rule's tags against `bundle`.
///
/// A technique missing from the bundle is logged and skipped.
pub fn validate(bundle: &StixBundle, relations: &MitreRelations) -> Vec<MitreError> {
    let mut errors = Vec::new();
    for (rule, rel) in &relations.rules {
        let rule_tactics: BTreeSet<&str> = rel.tactics.iter().map(String::as_str).collect();
        let mut all_tactics = BTreeSet::new();
        let mut all_names = BTreeSet::new();
        let mut all_urls = BTreeSet::new();

        for technique in &rel.techniques {
            let Some(obj) = bundle.find(technique) else {
                warn!(rule = %rule, technique = %technique, "technique not found in STIX data, skipping");
                continue;
            };
            let tactics = obj.tactic_names();
            let url = obj.attack_url();
            all_tactics.extend(tactics.iter().cloned());
            all_names.insert(obj.name.clone());
            all_urls.insert(url.clone());

            if !tactics
                .iter()
                .all(|t| rule_tactics.contains(tactic_tag(t).as_str()))
            {
                errors.push(MitreError {
                    rule: rule.clone(),
                    tactics_tags: rel.tactics.clone(),
                    techniques_tags: vec![technique.clone()],
                    mitre_tactics_names: tactics,
                    mitre_techniques_names: vec![obj.name.clone()],
                    mitre_techniques_urls: vec![url],
                    reasons: vec![ErrorReason::Missing],
                });
            }
        }

        if rel.tactics.len() > all_tactics.len() {
            errors.push(MitreError {
                rule: rule.clone(),
                tactics_tags: rel.tactics.clone(),
                techniques_tags: rel.techniques.clone(),
                mitre_tactics_names: all_tactics.into_iter().collect(),
                mitre_techniques_names: all_names.into_iter().collect(),
                mitre_techniques_urls: all_urls.into_iter().collect(),
                reasons: vec![ErrorReason::Overdo],
            });
        }
    }
    errors
}

/// Write `errors` as an `ErrorsReport` JSON document.
pub fn dump_errors(errors: &[MitreError], path: &Path) -> Result<()> {
    let report = ErrorsReport {
        errors: errors.to_vec(),
    };
    let raw = serde_json::to_string_pretty(&report)?;
    fs::write(path, raw).map_err(|e| Error::io(path, e))
}

/// Read a report written by `dump_errors`.
pub fn load_errors(path: &Path) -> Result<ErrorsReport> {
    let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Report location for `file`: `<stem>_mitre_errors.json` in `output_dir`,
/// or next to the rules file.
pub fn report_path(file: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{}_mitre_errors.json", stem);
    match output_dir {
        Some(dir) => dir.join(name),
        None => file.parent().unwrap_or(Path::new(".")).join(name),
    }
}

/// Validate each rules file and dump one errors report per file.
pub fn check_files(
    bundle: &StixBundle,
    files: &[PathBuf],
    output_dir: Option<&Path>,
) -> Result<Vec<FileReport>> {
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        info!(file = %file.display(), "checking MITRE ATT&CK tags");
        let source = fs::read_to_string(file).map_err(|e| Error::io(file, e))?;
        let relations = relations::parse_relations(&source, &file.display().to_string())?;
        let errors = validate(bundle, &relations);
        let report_path = report_path(file, output_dir);
        dump_errors(&errors, &report_path)?;
        info!(report = %report_path.display(), errors = errors.len(), "dumped MITRE errors report");
        reports.push(FileReport {
            file: file.clone(),
            report_path,
            errors,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mitre::stix::tests::bundle;
    use tempfile::tempdir;

    const RULES: &str = r#"
- required_engine_version: 0.31.0

- rule: wrong mitre rule
  desc: tactic does not match the technique
  condition: evt.type = execve
  output: x
  priority: WARNING
  tags: [container, T1610, mitre_lateral_movement]

- rule: wrong mitre rule multiple techniques and missing one tactic
  desc: exfiltration tactic is missing
  condition: evt.type = open
  output: x
  priority: WARNING
  tags: [T1020, T1552, mitre_credential_access, mitre_discovery]

- rule: too many tactics tags with multiple techniques
  desc: execution is not a tactic of any technique
  condition: evt.type = open
  output: x
  priority: WARNING
  tags: [T1087, T1552, T1020, mitre_discovery, mitre_exfiltration, mitre_credential_access, mitre_execution]

- rule: correct mitre rule
  desc: ok
  condition: evt.type = setuid
  output: x
  priority: NOTICE
  tags: [host, T1611, mitre_privilege_escalation]

- rule: correct tactic rule
  desc: ok
  condition: evt.type = connect
  output: x
  priority: NOTICE
  tags: [TA0001, mitre_initial_access]

- rule: unknown technique rule
  desc: ok
  condition: evt.type = connect
  output: x
  priority: NOTICE
  tags: [T0000]
"#;

    fn errors() -> Vec<MitreError> {
        let rels = relations::parse_relations(RULES, "rules.yaml").unwrap();
        validate(&bundle(), &rels)
    }

    fn by_rule<'a>(errors: &'a [MitreError], rule: &str) -> Vec<&'a MitreError> {
        errors.iter().filter(|e| e.rule == rule).collect()
    }

    #[test]
    fn test_tactic_not_matching_technique() {
        let errors = errors();
        let found = by_rule(&errors, "wrong mitre rule");
        assert_eq!(found.len(), 1);
        let e = found[0];
        assert_eq!(e.techniques_tags, vec!["T1610"]);
        assert_eq!(e.tactics_tags, vec!["mitre_lateral_movement"]);
        assert_eq!(e.mitre_tactics_names, vec!["defense-evasion", "execution"]);
        assert_eq!(e.mitre_techniques_names, vec!["Deploy Container"]);
        assert_eq!(
            e.mitre_techniques_urls,
            vec!["https://attack.mitre.org/techniques/T1610"]
        );
        assert_eq!(e.reasons, vec![ErrorReason::Missing]);
    }

    #[test]
    fn test_one_tactic_missing_among_techniques() {
        let errors = errors();
        let found = by_rule(
            &errors,
            "wrong mitre rule multiple techniques and missing one tactic",
        );
        assert_eq!(found.len(), 1);
        let e = found[0];
        assert_eq!(e.techniques_tags, vec!["T1020"]);
        assert_eq!(
            e.tactics_tags,
            vec!["mitre_credential_access", "mitre_discovery"]
        );
        assert_eq!(e.mitre_tactics_names, vec!["exfiltration"]);
        assert_eq!(e.reasons, vec![ErrorReason::Missing]);
    }

    #[test]
    fn test_too_many_tactics_tags() {
        let errors = errors();
        let found = by_rule(&errors, "too many tactics tags with multiple techniques");
        assert_eq!(found.len(), 1);
        let e = found[0];
        assert_eq!(e.reasons, vec![ErrorReason::Overdo]);
        assert_eq!(e.techniques_tags, vec!["T1087", "T1552", "T1020"]);
        assert_eq!(e.tactics_tags.len(), 4);
        assert_eq!(
            e.mitre_tactics_names,
            vec!["credential-access", "discovery", "exfiltration"]
        );
        assert_eq!(
            e.mitre_techniques_names,
            vec!["Account Discovery", "Automated Exfiltration", "Unsecured Credentials"]
        );
    }

    #[test]
    fn test_correct_rules_have_no_errors() {
        let errors = errors();
        assert!(by_rule(&errors, "correct mitre rule").is_empty());
        assert!(by_rule(&errors, "correct tactic rule").is_empty());
        assert!(by_rule(&errors, "unknown technique rule").is_empty());
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_reason_serialization() {
        assert_eq!(
            serde_json::to_value(ErrorReason::Missing).unwrap(),
            "One or more tactics tags are missing"
        );
        assert_eq!(
            serde_json::to_value(ErrorReason::Overdo).unwrap(),
            "Too many tactics tags"
        );
    }

    #[test]
    fn test_dump_and_load() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("errors.json");
        let errors = errors();
        dump_errors(&errors, &out).unwrap();
        let back = load_errors(&out).unwrap();
        assert_eq!(back.errors, errors);
    }

    #[test]
    fn test_report_path() {
        let file = Path::new("rules/falco_rules.yaml");
        assert_eq!(
            report_path(file, None),
            Path::new("rules/falco_rules_mitre_errors.json")
        );
        assert_eq!(
            report_path(file, Some(Path::new("out"))),
            Path::new("out/falco_rules_mitre_errors.json")
        );
    }

    #[test]
    fn test_check_files_writes_reports() {
        let dir = tempdir().unwrap();
        let rules = dir.path().join("falco_rules.yaml");
        fs::write(&rules, RULES).unwrap();
        let out = dir.path().join("reports");

        let reports = check_files(&bundle(), &[rules.clone()], Some(&out)).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].file, rules);
        assert_eq!(reports[0].errors.len(), 3);
        assert_eq!(
            reports[0].report_path,
            out.join("falco_rules_mitre_errors.json")
        );
        assert_eq!(load_errors(&reports[0].report_path).unwrap().errors.len(), 3);
    }

    #[test]
    fn test_check_files_rejects_non_rules_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("other.yaml");
        fs::write(&file, "- rule: r\n  tags: [T1610]\n").unwrap();
        assert!(matches!(
            check_files(&bundle(), &[file], None),
            Err(Error::Validation(_))
        ));
    }
}
