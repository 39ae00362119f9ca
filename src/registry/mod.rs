//! Registry tooling: catalog checks, artifact packaging and index upkeep.
//!
//! Pushing artifacts to an OCI repository or a bucket happens outside this
//! tool; `package` prepares everything such a push needs and `update_index`
//! records which rulesfiles ended up published.

pub mod config_layer;
pub mod index;
pub mod requirements;
pub mod tag;
pub mod targz;

use crate::error::{Error, Result};
use crate::models::registry::Registry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load and validate a registry file.
pub fn check(path: &Path) -> Result<Registry> {
    let registry = Registry::load(path)?;
    registry.validate()?;
    Ok(registry)
}

/// Refresh `index_path` for the rulesfiles named in `published`.
///
/// Each published rulesfile is expected under `<oci_prefix>/<name>`.
/// Returns the number of entries upserted.
pub fn update_index(
    registry_path: &Path,
    index_path: &Path,
    oci_prefix: &str,
    published: &[String],
) -> Result<usize> {
    let registry = Registry::load(registry_path)?;
    let mut artifacts = BTreeMap::new();
    for name in published {
        if !registry.rulesfiles.iter().any(|rf| &rf.name == name) {
            warn!(rulesfile = %name, "published artifact is not in the registry, skipping");
            continue;
        }
        artifacts.insert(name.clone(), format!("{}/{}", oci_prefix, name));
    }
    registry.validate()?;
    index::upsert_index_file(&registry, &artifacts, index_path)?;
    info!(index = %index_path.display(), entries = artifacts.len(), "index updated");
    Ok(artifacts.len())
}

/// Everything needed to push one rulesfile release.
#[derive(Debug, Clone, Serialize)]
pub struct PackagePlan {
    pub name: String,
    pub version: String,
    pub reference: String,
    pub tags: Vec<String>,
    pub archive: PathBuf,
    pub config: PathBuf,
}

/// Package the rulesfile released by `git_tag` into `out_dir`.
///
/// Writes `<file>.tar.gz` and `config.json`; rulesfile paths are resolved
/// against the registry file's directory.
pub fn package(
    registry_path: &Path,
    git_tag: &str,
    out_dir: &Path,
    oci_prefix: &str,
    existing_tags: &[String],
) -> Result<PackagePlan> {
    let parsed = tag::parse_git_tag(git_tag)?;
    let registry = Registry::load(registry_path)?;
    let rf = registry.rulesfile_by_name(&parsed.name).ok_or_else(|| {
        Error::NotFound(format!("could not find rulesfile {} in registry", parsed.name))
    })?;

    let base = registry_path.parent().unwrap_or_else(|| Path::new(""));
    let source = base.join(&rf.path);
    let file_name = source
        .file_name()
        .ok_or_else(|| Error::NotFound(format!("rulesfile {} has no path", rf.name)))?
        .to_string_lossy()
        .into_owned();

    fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;
    let archive = out_dir.join(format!("{}.tar.gz", file_name));
    targz::tar_gz_single_file(&archive, &source)?;

    let version = parsed.version();
    let cfg = config_layer::rulesfile_config(&rf.name, &version, &source)?;
    let config = out_dir.join("config.json");
    let raw = serde_json::to_string_pretty(&cfg)?;
    fs::write(&config, raw).map_err(|e| Error::io(&config, e))?;

    let tags = tag::oci_tags_to_update(&parsed.semver, existing_tags);
    let reference = format!("{}/{}", oci_prefix, rf.name);
    info!(%reference, tags = ?tags, archive = %archive.display(), "rulesfile packaged");

    Ok(PackagePlan {
        name: rf.name.clone(),
        version,
        reference,
        tags,
        archive,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const REGISTRY: &str = r#"
rulesfiles:
  - name: falco-rules
    description: Falco rules that are loaded by default
    path: rules/falco_rules.yaml
    url: https://github.com/falcosecurity/rules/blob/main/rules/falco_rules.yaml
    license: apache-2.0
  - name: legacy-rules
    path: rules/legacy.yaml
    archived: true
"#;

    fn fixture() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("registry.yaml"), REGISTRY).unwrap();
        fs::create_dir_all(dir.path().join("rules")).unwrap();
        fs::write(
            dir.path().join("rules/falco_rules.yaml"),
            "- required_engine_version: 0.26.0\n\n- list: shell_binaries\n  items: [bash]\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_check() {
        let dir = fixture();
        let reg = check(&dir.path().join("registry.yaml")).unwrap();
        assert_eq!(reg.rulesfiles.len(), 2);

        fs::write(
            dir.path().join("bad.yaml"),
            "rulesfiles:\n  - name: a\n  - name: a\n",
        )
        .unwrap();
        assert!(check(&dir.path().join("bad.yaml")).is_err());
    }

    #[test]
    fn test_package_writes_archive_and_config() {
        let dir = fixture();
        let out = dir.path().join("out");
        let plan = package(
            &dir.path().join("registry.yaml"),
            "falco-rules-3.1.0",
            &out,
            "ghcr.io/falcosecurity/rules",
            &["3.0.0".to_string()],
        )
        .unwrap();

        assert_eq!(plan.reference, "ghcr.io/falcosecurity/rules/falco-rules");
        assert_eq!(plan.tags, vec!["3.1.0", "3.1", "3", "latest"]);
        assert!(out.join("falco_rules.yaml.tar.gz").is_file());
        let cfg: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&plan.config).unwrap()).unwrap();
        assert_eq!(cfg["version"], "3.1.0");
        assert_eq!(cfg["requirements"][0]["version"], "0.26.0");
    }

    #[test]
    fn test_package_rejects_unknown_or_archived() {
        let dir = fixture();
        let reg = dir.path().join("registry.yaml");
        let out = dir.path().join("out");
        assert!(package(&reg, "legacy-rules-1.0.0", &out, "p", &[]).is_err());
        assert!(package(&reg, "nope-1.0.0", &out, "p", &[]).is_err());
        assert!(matches!(
            package(&reg, "falco-rules", &out, "p", &[]),
            Err(Error::Tag(_))
        ));
    }

    #[test]
    fn test_update_index_only_published() {
        let dir = fixture();
        let index = dir.path().join("index.yaml");
        let n = update_index(
            &dir.path().join("registry.yaml"),
            &index,
            "ghcr.io/falcosecurity/rules",
            &["falco-rules".to_string(), "ghost".to_string()],
        )
        .unwrap();
        assert_eq!(n, 1);
        let idx = index::Index::read(&index).unwrap();
        assert_eq!(idx.entries[0].repository, "falcosecurity/rules/falco-rules");
    }
}
