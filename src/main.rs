//! falco-rules-tools binary entry point.
//! Resolves configuration, delegates to the library and prints results.

use clap::Parser;
use falco_rules_tools::checker::{self, EngineRunner};
use falco_rules_tools::cli::{Cli, Commands, RegistryCmd};
use falco_rules_tools::config::{self, Effective, Overrides, OCI_REPO_PREFIX_ENV};
use falco_rules_tools::error::{Error, Result};
use falco_rules_tools::explorer::{self, ExploreOptions};
use falco_rules_tools::models::RulesetDescription;
use falco_rules_tools::mitre::{self, stix::StixBundle};
use falco_rules_tools::utils::{error_prefix, expand_inputs, info_prefix, init_logging, note_prefix, rel_to_wd};
use falco_rules_tools::{output, registry};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exit code for bad invocations and configuration problems.
const EXIT_USAGE: i32 = 2;

fn die(msg: impl Display, code: i32) -> ! {
    eprintln!("{} {}", error_prefix(), msg);
    std::process::exit(code)
}

/// Unwrap a runtime result, exiting with 1 on error.
fn ok_or_die<T>(res: Result<T>) -> T {
    res.unwrap_or_else(|e| die(e, 1))
}

fn effective(cli: &Overrides) -> Effective {
    config::resolve_effective(cli).unwrap_or_else(|e| die(e, EXIT_USAGE))
}

fn require_prefix() -> String {
    config::require_env(OCI_REPO_PREFIX_ENV).unwrap_or_else(|e| die(e, EXIT_USAGE))
}

/// Load one side of a comparison from a captured description or the engine.
fn load_side(
    side: &str,
    json: Option<&str>,
    rules: &[String],
    runner: &EngineRunner,
    engine_config: Option<&Path>,
    extra_files: &[PathBuf],
) -> Result<RulesetDescription> {
    if let Some(path) = json {
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        return Ok(serde_json::from_str(&raw)?);
    }
    let files = expand_inputs(rules)?;
    debug!(side, files = ?files, "describing rules with the engine");
    runner.describe(&files, engine_config, extra_files)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Compare {
            left,
            right,
            left_json,
            right_json,
            config,
            file,
            falco_image,
            output,
            root,
        } => {
            if left.is_empty() && left_json.is_none() {
                die("left side is empty: pass --left or --left-json", EXIT_USAGE);
            }
            if right.is_empty() && right_json.is_none() {
                die("right side is empty: pass --right or --right-json", EXIT_USAGE);
            }
            let eff = effective(&Overrides {
                root: root.as_deref(),
                falco_image: falco_image.as_deref(),
                output: output.as_deref(),
                ..Default::default()
            });
            let runner = EngineRunner::new(eff.falco_image, eff.falco_entrypoint);
            let extra = ok_or_die(expand_inputs(&file));
            let engine_config = config.as_deref().map(Path::new);

            let l = ok_or_die(load_side("left", left_json.as_deref(), &left, &runner, engine_config, &extra));
            let r = ok_or_die(load_side("right", right_json.as_deref(), &right, &runner, engine_config, &extra));
            let report = checker::compare(&l, &r);
            output::print_compare(&report, &eff.output);
        }
        Commands::Validate {
            files,
            falco_image,
            root,
        } => {
            let eff = effective(&Overrides {
                root: root.as_deref(),
                falco_image: falco_image.as_deref(),
                ..Default::default()
            });
            let files = ok_or_die(expand_inputs(&files));
            let runner = EngineRunner::new(eff.falco_image, eff.falco_entrypoint);
            let validation = ok_or_die(runner.validate(&files));
            output::print_validation(&validation, &eff.output);
            if let Some(e) = validation.error {
                die(e, 1);
            }
        }
        Commands::Registry { cmd } => {
            let eff = effective(&Overrides::default());
            match cmd {
                RegistryCmd::Check { file } => {
                    let reg = ok_or_die(registry::check(Path::new(&file)));
                    println!("{}: {} rulesfiles, all names valid", file, reg.rulesfiles.len());
                }
                RegistryCmd::UpdateIndex {
                    registry: registry_file,
                    index,
                    published,
                } => {
                    let prefix = require_prefix();
                    if published.is_empty() {
                        eprintln!("{} no --published rulesfiles given; index entries stay as they are", note_prefix());
                    }
                    let index = PathBuf::from(index);
                    let n = ok_or_die(registry::update_index(
                        Path::new(&registry_file),
                        &index,
                        &prefix,
                        &published,
                    ));
                    output::print_written("index updated", &index, n, &eff.output);
                }
                RegistryCmd::Package {
                    registry: registry_file,
                    git_tag,
                    out,
                    existing_tag,
                } => {
                    let prefix = require_prefix();
                    let out_dir = PathBuf::from(out.unwrap_or_else(|| "dist".to_string()));
                    let plan = ok_or_die(registry::package(
                        Path::new(&registry_file),
                        &git_tag,
                        &out_dir,
                        &prefix,
                        &existing_tag,
                    ));
                    output::print_package(&plan, &eff.output);
                }
            }
        }
        Commands::Explore {
            registry: registry_file,
            rules_dir,
            index,
            cross_file,
            output,
            root,
        } => {
            let eff = effective(&Overrides {
                root: root.as_deref(),
                output: output.as_deref(),
                explorer_registry: registry_file.as_deref(),
                rules_dir: rules_dir.as_deref(),
                index: index.as_deref(),
                cross_file: cross_file.then_some(true),
                ..Default::default()
            });
            if !eff.config_found && eff.output != "json" {
                eprintln!("{} No falco-rules-tools.toml found; using defaults.", note_prefix());
            }
            if !eff.explorer_registry.is_file() {
                die(
                    format!(
                        "Explorer registry not found: {} (pass --registry or configure falco-rules-tools.toml)",
                        eff.explorer_registry.display()
                    ),
                    EXIT_USAGE,
                );
            }
            let opts = ExploreOptions {
                registry: eff.explorer_registry,
                rules_dir: eff.rules_dir,
                index: eff.index,
                cross_file: eff.cross_file,
            };
            if eff.output != "json" {
                eprintln!("{} reading rules from {}", info_prefix(), rel_to_wd(&opts.rules_dir));
            }
            let n = ok_or_die(explorer::run(&opts));
            output::print_written("index written", &opts.index, n, &eff.output);
        }
        Commands::MitreCheck {
            files,
            stix,
            output_dir,
            output,
            root,
        } => {
            let eff = effective(&Overrides {
                root: root.as_deref(),
                output: output.as_deref(),
                ..Default::default()
            });
            let files = ok_or_die(expand_inputs(&files));
            let stix = PathBuf::from(stix);
            let bundle = ok_or_die(StixBundle::load(&stix));
            if eff.output != "json" {
                eprintln!(
                    "{} loaded {} STIX objects from {}",
                    info_prefix(),
                    bundle.objects.len(),
                    rel_to_wd(&stix)
                );
            }
            let out_dir = output_dir.map(PathBuf::from);
            let reports = ok_or_die(mitre::check_files(&bundle, &files, out_dir.as_deref()));
            output::print_mitre(&reports, &eff.output);
        }
    }
}
