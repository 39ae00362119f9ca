//! Output rendering for compare, validate, registry, explore and mitre-check commands.
//!
//! Supports `human` (default) and `json` outputs. The human form of a
//! comparison is markdown so it can be pasted into a pull request as-is.

use crate::checker::engine::Validation;
use crate::checker::ChangeReport;
use crate::mitre::FileReport;
use crate::registry::PackagePlan;
use crate::utils::rel_to_wd;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Print a change report in the requested format.
pub fn print_compare(report: &ChangeReport, output: &str) {
    match output {
        "json" => println!("{:#}", compose_compare_json(report)),
        _ => {
            if report.is_empty() {
                let line = "no changes detected";
                if use_colors(output) {
                    eprintln!("{}", line.bright_black());
                } else {
                    eprintln!("{}", line);
                }
                return;
            }
            print!("{}", compose_compare_markdown(report));
        }
    }
}

/// Markdown rendering of the non-empty tiers, major first.
pub fn compose_compare_markdown(report: &ChangeReport) -> String {
    let mut out = String::new();
    for (tier, lines) in report.tiers() {
        out.push_str(&format!("**{}** changes:\n", tier));
        for line in lines {
            out.push_str(&format!("* {}\n", line));
        }
        out.push('\n');
    }
    out
}

/// Compose compare JSON object (pure) for testing/snapshot purposes.
pub fn compose_compare_json(report: &ChangeReport) -> JsonVal {
    json!({
        "major": report.major,
        "minor": report.minor,
        "patch": report.patch,
    })
}

/// Print per-file validation results; engine output is echoed on failure.
pub fn print_validation(v: &Validation, output: &str) {
    match output {
        "json" => println!("{:#}", compose_validation_json(v)),
        _ => {
            let color = use_colors(output);
            for r in &v.results {
                let file = rel_to_wd(Path::new(&r.name));
                let counts = format!("errors={} warnings={}", r.errors.len(), r.warnings.len());
                match (r.has_issues(), color) {
                    (false, true) => println!("{} {}", "✔ valid:".green().bold(), file.bold()),
                    (false, false) => println!("✔ valid: {}", file),
                    (true, true) => println!("{} {} {}", "✖ invalid:".red().bold(), file.bold(), counts),
                    (true, false) => println!("✖ invalid: {} {}", file, counts),
                }
            }
            if v.has_issues() && !v.stdout.is_empty() {
                println!("{}", v.stdout);
            }
            if v.error.is_some() && !v.stderr.is_empty() {
                eprintln!("{}", v.stderr);
            }
        }
    }
}

pub fn compose_validation_json(v: &Validation) -> JsonVal {
    let items: Vec<_> = v
        .results
        .iter()
        .map(|r| {
            json!({
                "name": r.name,
                "successful": r.successful,
                "errors": r.errors,
                "warnings": r.warnings,
            })
        })
        .collect();
    json!({
        "results": items,
        "error": v.error.as_ref().map(|e| e.to_string()),
    })
}

/// Print what `registry package` produced and where it should go.
pub fn print_package(plan: &PackagePlan, output: &str) {
    match output {
        "json" => println!("{:#}", compose_package_json(plan)),
        _ => {
            let color = use_colors(output);
            let archive = rel_to_wd(&plan.archive);
            let config = rel_to_wd(&plan.config);
            if color {
                println!("{} {} {}", "📦 packaged:".green().bold(), plan.name.bold(), plan.version);
            } else {
                println!("📦 packaged: {} {}", plan.name, plan.version);
            }
            println!("  archive:   {}", archive);
            println!("  config:    {}", config);
            println!("  reference: {}", plan.reference);
            println!("  tags:      {}", plan.tags.join(", "));
        }
    }
}

pub fn compose_package_json(plan: &PackagePlan) -> JsonVal {
    json!({
        "name": plan.name,
        "version": plan.version,
        "reference": plan.reference,
        "tags": plan.tags,
        "archive": plan.archive.display().to_string(),
        "config": plan.config.display().to_string(),
    })
}

/// Print MITRE tag errors per rules file.
pub fn print_mitre(reports: &[FileReport], output: &str) {
    match output {
        "json" => println!("{:#}", compose_mitre_json(reports)),
        _ => {
            let color = use_colors(output);
            for r in reports {
                let file = rel_to_wd(&r.file);
                let head = format!("{} MITRE errors in {}", r.errors.len(), file);
                if color && r.errors.is_empty() {
                    println!("{}", head.green());
                } else if color {
                    println!("{}", head.red().bold());
                } else {
                    println!("{}", head);
                }
                for e in &r.errors {
                    let reasons: Vec<String> = e
                        .reasons
                        .iter()
                        .filter_map(|x| serde_json::to_value(x).ok())
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect();
                    println!(
                        "  - {}: techniques [{}], tactics [{}], expected [{}]: {}",
                        e.rule,
                        e.techniques_tags.join(", "),
                        e.tactics_tags.join(", "),
                        e.mitre_tactics_names.join(", "),
                        reasons.join("; ")
                    );
                }
                println!("  report: {}", rel_to_wd(&r.report_path));
            }
        }
    }
}

pub fn compose_mitre_json(reports: &[FileReport]) -> JsonVal {
    JsonVal::Array(
        reports
            .iter()
            .map(|r| {
                json!({
                    "file": r.file.display().to_string(),
                    "report": r.report_path.display().to_string(),
                    "errors": r.errors,
                })
            })
            .collect(),
    )
}

/// One-line summary for commands that write a file.
pub fn print_written(what: &str, path: &Path, count: usize, output: &str) {
    match output {
        "json" => println!(
            "{:#}",
            json!({"file": path.display().to_string(), "entries": count})
        ),
        _ => {
            let file = rel_to_wd(path);
            if use_colors(output) {
                println!("{} {} ({} entries)", format!("✏️  {}:", what).green().bold(), file.bold(), count);
            } else {
                println!("✏️  {}: {} ({} entries)", what, file, count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::engine::LoadResult;
    use crate::error::Error;
    use std::path::PathBuf;

    fn report() -> ChangeReport {
        ChangeReport {
            major: vec!["Rule `r1` has been removed".into()],
            minor: vec![],
            patch: vec![
                "List `l1` has some item added or removed".into(),
                "Rule `r2` has been enabled at default".into(),
            ],
        }
    }

    #[test]
    fn test_compose_compare_markdown_skips_empty_tiers() {
        let md = compose_compare_markdown(&report());
        assert_eq!(
            md,
            "**Major** changes:\n* Rule `r1` has been removed\n\n**Patch** changes:\n* List `l1` has some item added or removed\n* Rule `r2` has been enabled at default\n\n"
        );
        assert_eq!(compose_compare_markdown(&ChangeReport::default()), "");
    }

    #[test]
    fn test_compose_compare_json_shape() {
        let out = compose_compare_json(&report());
        assert_eq!(out["major"][0], "Rule `r1` has been removed");
        assert_eq!(out["minor"].as_array().unwrap().len(), 0);
        assert_eq!(out["patch"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_compose_validation_json_shape() {
        let v = Validation {
            results: vec![LoadResult {
                name: "/rules/a.yaml".into(),
                successful: true,
                errors: vec![],
                warnings: vec![json!({"code": "LOAD_UNUSED_MACRO"})],
            }],
            stdout: String::new(),
            stderr: String::new(),
            error: Some(Error::Engine("rules validation had warning or errors".into())),
        };
        let out = compose_validation_json(&v);
        assert_eq!(out["results"][0]["warnings"][0]["code"], "LOAD_UNUSED_MACRO");
        assert_eq!(out["error"], "rules validation had warning or errors");
    }

    #[test]
    fn test_compose_package_json_shape() {
        let plan = PackagePlan {
            name: "falco-rules".into(),
            version: "3.1.0".into(),
            reference: "ghcr.io/falcosecurity/rules/falco-rules".into(),
            tags: vec!["3.1.0".into(), "latest".into()],
            archive: PathBuf::from("dist/falco_rules.yaml.tar.gz"),
            config: PathBuf::from("dist/config.json"),
        };
        let out = compose_package_json(&plan);
        assert_eq!(out["tags"][1], "latest");
        assert_eq!(out["archive"], "dist/falco_rules.yaml.tar.gz");
    }

    #[test]
    fn test_compose_mitre_json_shape() {
        use crate::mitre::{ErrorReason, MitreError};
        let reports = vec![FileReport {
            file: PathBuf::from("rules/falco_rules.yaml"),
            report_path: PathBuf::from("rules/falco_rules_mitre_errors.json"),
            errors: vec![MitreError {
                rule: "wrong mitre rule".into(),
                tactics_tags: vec!["mitre_lateral_movement".into()],
                techniques_tags: vec!["T1610".into()],
                mitre_tactics_names: vec!["defense-evasion".into(), "execution".into()],
                mitre_techniques_names: vec!["Deploy Container".into()],
                mitre_techniques_urls: vec!["https://attack.mitre.org/techniques/T1610".into()],
                reasons: vec![ErrorReason::Missing],
            }],
        }];
        let out = compose_mitre_json(&reports);
        assert_eq!(out[0]["report"], "rules/falco_rules_mitre_errors.json");
        assert_eq!(out[0]["errors"][0]["rule"], "wrong mitre rule");
        assert_eq!(
            out[0]["errors"][0]["reasons"][0],
            "One or more tactics tags are missing"
        );
    }
}
