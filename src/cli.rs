//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "falco-rules-tools",
    version,
    about = "Build and CI tooling for Falco rules files",
    long_about = "falco-rules-tools classifies rule set changes as major/minor/patch, validates and packages rulesfile registries, and builds the rules explorer index.\n\nConfiguration precedence: CLI > falco-rules-tools.toml > defaults.",
    after_help = "Examples:\n  falco-rules-tools compare -l old/falco_rules.yaml -r rules/falco_rules.yaml\n  falco-rules-tools validate 'rules/*.yaml'\n  falco-rules-tools registry check registry.yaml\n  falco-rules-tools explore --cross-file",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::SetTrue, help = "Enable debug logging")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(
        about = "Show version",
        long_about = "Print the current falco-rules-tools version."
    )]
    Version,
    /// Classify changes between two rule sets
    #[command(
        about = "Compare two versions of a rule set",
        long_about = "Load both sides with the rules engine (or read pre-captured engine descriptions) and report changes grouped as major, minor and patch.",
        after_help = "Examples:\n  falco-rules-tools compare -l old/falco_rules.yaml -r rules/falco_rules.yaml\n  falco-rules-tools compare --left-json old.json --right-json new.json --output json"
    )]
    Compare {
        #[arg(long, short = 'l', help = "Rules file (or glob) for the left side; repeatable")]
        left: Vec<String>,
        #[arg(long, short = 'r', help = "Rules file (or glob) for the right side; repeatable")]
        right: Vec<String>,
        #[arg(long, help = "Pre-captured engine description for the left side")]
        left_json: Option<String>,
        #[arg(long, help = "Pre-captured engine description for the right side")]
        right_json: Option<String>,
        #[arg(long, short = 'c', help = "Engine config file mounted into the container")]
        config: Option<String>,
        #[arg(long, short = 'f', help = "Extra file mounted into the container; repeatable")]
        file: Vec<String>,
        #[arg(long, short = 'i', help = "Rules engine container image")]
        falco_image: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        root: Option<String>,
    },
    /// Validate rules files with the rules engine
    #[command(
        about = "Validate rules files",
        long_about = "Run the rules engine in validation mode over the given files. Any warning or error fails the run.",
        after_help = "Examples:\n  falco-rules-tools validate rules/falco_rules.yaml\n  falco-rules-tools validate 'rules/*.yaml' -i falcosecurity/falco-no-driver:0.37.0"
    )]
    Validate {
        #[arg(required = true, help = "Rules files or globs")]
        files: Vec<String>,
        #[arg(long, short = 'i', help = "Rules engine container image")]
        falco_image: Option<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        root: Option<String>,
    },
    /// Rulesfile registry tooling
    #[command(
        about = "Check, package and index registry rulesfiles",
        long_about = "Operate on a rulesfile registry: validate it, package a tagged rulesfile as an OCI artifact, or refresh the distribution index."
    )]
    Registry {
        #[command(subcommand)]
        cmd: RegistryCmd,
    },
    /// Build the rules explorer index
    #[command(
        about = "Scrape rules files into the explorer index",
        long_about = "Read every rules file listed in the explorer registry from the local rules directory, compute dependency edges and write a single JSON index.",
        after_help = "Examples:\n  falco-rules-tools explore\n  falco-rules-tools explore --registry explorer.yaml --rules-dir rules --index site/index.json --cross-file"
    )]
    Explore {
        #[arg(long, help = "Explorer registry file (default: registry.yaml)")]
        registry: Option<String>,
        #[arg(long, help = "Directory holding the rules files (default: rules)")]
        rules_dir: Option<String>,
        #[arg(long, help = "Output index path (default: index.json)")]
        index: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Resolve dependencies across all files")]
        cross_file: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        root: Option<String>,
    },
    /// Check MITRE ATT&CK tags of rules
    #[command(
        about = "Check MITRE ATT&CK tags against STIX data",
        long_about = "Look up each rule's technique tags in a local MITRE ATT&CK STIX bundle and report missing or superfluous mitre_* tactic tags. One <stem>_mitre_errors.json report is written per rules file.",
        after_help = "Examples:\n  falco-rules-tools mitre-check -f rules/falco_rules.yaml --stix enterprise-attack.json\n  falco-rules-tools mitre-check -f 'rules/*.yaml' --stix enterprise-attack.json -o reports --output json"
    )]
    MitreCheck {
        #[arg(long = "file", short = 'f', required = true, help = "Rules file or glob; repeatable")]
        files: Vec<String>,
        #[arg(long, help = "MITRE ATT&CK STIX bundle (e.g. enterprise-attack.json)")]
        stix: String,
        #[arg(long, short = 'o', help = "Directory for error reports (default: next to each rules file)")]
        output_dir: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        root: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RegistryCmd {
    /// Validate a registry file
    #[command(
        about = "Validate rulesfile names in a registry",
        after_help = "Examples:\n  falco-rules-tools registry check registry.yaml"
    )]
    Check {
        #[arg(help = "Path to registry.yaml")]
        file: String,
    },
    /// Update the distribution index
    #[command(
        about = "Upsert published rulesfiles into the distribution index",
        long_about = "Add or replace index entries for the rulesfiles named with --published. Reads OCI_REPO_PREFIX from the environment.",
        after_help = "Examples:\n  OCI_REPO_PREFIX=ghcr.io/falcosecurity/rules falco-rules-tools registry update-index registry.yaml index.yaml --published falco-rules"
    )]
    UpdateIndex {
        #[arg(help = "Path to registry.yaml")]
        registry: String,
        #[arg(help = "Path to the distribution index")]
        index: String,
        #[arg(long, help = "Name of a published rulesfile; repeatable")]
        published: Vec<String>,
    },
    /// Package a tagged rulesfile
    #[command(
        about = "Package the rulesfile released by a git tag",
        long_about = "Parse <name>-<semver> from the git tag, archive the matching rulesfile and write its OCI config layer. Reads OCI_REPO_PREFIX from the environment.",
        after_help = "Examples:\n  falco-rules-tools registry package registry.yaml falco-rules-3.1.0 --out dist --existing-tag 3.0.0"
    )]
    Package {
        #[arg(help = "Path to registry.yaml")]
        registry: String,
        #[arg(help = "Git tag, e.g. falco-rules-3.1.0")]
        git_tag: String,
        #[arg(long, help = "Output directory (default: dist)")]
        out: Option<String>,
        #[arg(long, help = "Tag already published for this rulesfile; repeatable")]
        existing_tag: Vec<String>,
    },
}
