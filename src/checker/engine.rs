//! Rules engine invoked as a container subprocess.
//!
//! The engine is a black box: we mount the rules files read-only at their
//! absolute paths, run it with JSON output enabled and parse what it
//! prints on stdout.

use crate::error::{err_append, Error, Result};
use crate::models::description::RulesetDescription;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

pub const DEFAULT_IMAGE: &str = "falcosecurity/falco-no-driver:master";
pub const DEFAULT_ENTRYPOINT: &str = "/usr/bin/falco";

/// Container runner for the rules engine.
#[derive(Debug, Clone)]
pub struct EngineRunner {
    pub docker: String,
    pub image: String,
    pub entrypoint: String,
}

/// Raw result of one engine run.
#[derive(Debug, Default)]
pub struct EngineOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub error: Option<Error>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadResult {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub successful: bool,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    #[serde(default)]
    pub warnings: Vec<serde_json::Value>,
}

impl LoadResult {
    pub fn has_issues(&self) -> bool {
        !self.successful || !self.errors.is_empty() || !self.warnings.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct LoadResults {
    #[serde(default)]
    falco_load_results: Vec<LoadResult>,
}

/// Outcome of a `-V` validation run.
#[derive(Debug, Default)]
pub struct Validation {
    pub results: Vec<LoadResult>,
    pub stdout: String,
    pub stderr: String,
    /// Aggregated failure, `None` when every file loaded cleanly.
    pub error: Option<Error>,
}

impl Validation {
    pub fn has_issues(&self) -> bool {
        self.results.iter().any(LoadResult::has_issues)
    }
}

fn absolute(p: &Path) -> Result<PathBuf> {
    std::path::absolute(p).map_err(|e| Error::io(p, e))
}

impl EngineRunner {
    pub fn new(image: impl Into<String>, entrypoint: impl Into<String>) -> Self {
        EngineRunner {
            docker: "docker".to_string(),
            image: image.into(),
            entrypoint: entrypoint.into(),
        }
    }

    /// Full `docker run` argument vector.
    pub fn docker_args(&self, mounts: &[PathBuf], engine_args: &[String]) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--entrypoint".to_string(),
            self.entrypoint.clone(),
        ];
        for m in mounts {
            let m = m.display();
            args.push("-v".to_string());
            args.push(format!("{m}:{m}:ro"));
        }
        args.push(self.image.clone());
        args.extend(engine_args.iter().cloned());
        args
    }

    fn run(&self, mounts: &[PathBuf], engine_args: &[String]) -> EngineOutput {
        let args = self.docker_args(mounts, engine_args);
        debug!(docker = %self.docker, args = ?args, "running rules engine");
        let mut out = EngineOutput::default();
        match Command::new(&self.docker).args(&args).output() {
            Ok(o) => {
                out.stdout = String::from_utf8_lossy(&o.stdout).into_owned();
                out.stderr = String::from_utf8_lossy(&o.stderr).into_owned();
                out.exit_code = o.status.code();
            }
            Err(e) => {
                out.error = Some(Error::Engine(format!(
                    "failed to run {}: {}",
                    self.docker, e
                )));
            }
        }
        if let Some(code) = out.exit_code.filter(|c| *c != 0) {
            out.error = err_append(
                out.error.take(),
                Some(Error::Engine(format!("unexpected exit code ({code})"))),
            );
        }
        out
    }

    /// Load `rules` and return the engine's description of them (`-L`).
    pub fn describe(
        &self,
        rules: &[PathBuf],
        config: Option<&Path>,
        extra_files: &[PathBuf],
    ) -> Result<RulesetDescription> {
        let mut mounts = Vec::new();
        let mut args = vec![
            "-o".to_string(),
            "json_output=true".to_string(),
            "-L".to_string(),
        ];
        for r in rules {
            let abs = absolute(r)?;
            args.push("-r".to_string());
            args.push(abs.display().to_string());
            mounts.push(abs);
        }
        if let Some(c) = config {
            let abs = absolute(c)?;
            args.push("-c".to_string());
            args.push(abs.display().to_string());
            mounts.push(abs);
        }
        for f in extra_files {
            mounts.push(absolute(f)?);
        }

        let out = self.run(&mounts, &args);
        let desc: RulesetDescription = match serde_json::from_str(&out.stdout) {
            Ok(d) => d,
            Err(e) => {
                info!("{}", out.stderr);
                return Err(e.into());
            }
        };
        match out.error {
            Some(e) => Err(e),
            None => Ok(desc),
        }
    }

    /// Validate `rules` with the engine (`-V`).
    pub fn validate(&self, rules: &[PathBuf]) -> Result<Validation> {
        let mut mounts = Vec::new();
        let mut args = vec!["-o".to_string(), "json_output=true".to_string()];
        for r in rules {
            let abs = absolute(r)?;
            args.push("-V".to_string());
            args.push(abs.display().to_string());
            mounts.push(abs);
        }
        let out = self.run(&mounts, &args);
        Ok(collect_validation(out))
    }
}

/// Fold an engine run into a validation outcome.
pub fn collect_validation(out: EngineOutput) -> Validation {
    let mut error = None;
    let results = match serde_json::from_str::<LoadResults>(&out.stdout) {
        Ok(r) => r.falco_load_results,
        Err(e) if out.error.is_none() => {
            error = Some(Error::Json(e));
            Vec::new()
        }
        Err(_) => Vec::new(),
    };
    if results.iter().any(LoadResult::has_issues) {
        error = err_append(
            error,
            Some(Error::Validation(
                "rules validation had warning or errors".to_string(),
            )),
        );
    }
    Validation {
        results,
        stdout: out.stdout,
        stderr: out.stderr,
        error: err_append(error, out.error),
    }
}
