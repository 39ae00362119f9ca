//! Release tags: `<rulesfile>-<semver>` git tags and the OCI tags they move.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([a-z]+[a-z0-9_\-]*)-((0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)(-((0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*)(\.(0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*))*))?)$",
    )
    .expect("valid git tag regex")
});

/// Rulesfile name and version decoded from a git tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSemver {
    pub name: String,
    pub semver: Version,
}

impl NameSemver {
    pub fn version(&self) -> String {
        self.semver.to_string()
    }
}

pub fn parse_git_tag(tag: &str) -> Result<NameSemver> {
    let caps = TAG_RE
        .captures(tag)
        .ok_or_else(|| Error::Tag(tag.to_string()))?;
    let raw = &caps[2];
    let semver = Version::parse(raw).map_err(|source| Error::InvalidVersion {
        value: raw.to_string(),
        source,
    })?;
    Ok(NameSemver {
        name: caps[1].to_string(),
        semver,
    })
}

fn is_newest(new: &Version, others: &[Version], same_line: impl Fn(&Version) -> bool) -> bool {
    !others.iter().any(|v| same_line(v) && v > new)
}

/// Tags to (re)point at a newly published version.
///
/// The full version is always included. Pre-releases move nothing else;
/// otherwise `MAJOR.MINOR`, `MAJOR` and `latest` are added when the new
/// version is the newest of its minor line, major line and overall.
/// Existing pre-release or non-semver tags are ignored.
pub fn oci_tags_to_update(new: &Version, existing: &[String]) -> Vec<String> {
    let mut tags = vec![new.to_string()];
    if !new.pre.is_empty() {
        return tags;
    }

    let finals: Vec<Version> = existing
        .iter()
        .filter_map(|t| Version::parse(t).ok())
        .filter(|v| v.pre.is_empty())
        .collect();
    if is_newest(new, &finals, |v| v.major == new.major && v.minor == new.minor) {
        tags.push(format!("{}.{}", new.major, new.minor));
    }
    if is_newest(new, &finals, |v| v.major == new.major) {
        tags.push(new.major.to_string());
    }
    if is_newest(new, &finals, |_| true) {
        tags.push("latest".to_string());
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_git_tag() {
        let cases = [
            ("k8saudit-0.4.0-rc1", "k8saudit", "0.4.0-rc1"),
            ("k8saudit-extended-0.1.1", "k8saudit-extended", "0.1.1"),
            ("dummy_c-eks-1.2.3-rc4", "dummy_c-eks", "1.2.3-rc4"),
            ("falco-rules-3.0.0", "falco-rules", "3.0.0"),
        ];
        for (tag, name, version) in cases {
            let got = parse_git_tag(tag).unwrap();
            assert_eq!(got.name, name, "{tag}");
            assert_eq!(got.version(), version, "{tag}");
        }
    }

    #[test]
    fn test_parse_git_tag_rejects_malformed() {
        for tag in ["falco-rules", "Falco-1.0.0", "falco-rules-1.0", "falco-rules-01.0.0"] {
            let err = parse_git_tag(tag).unwrap_err();
            assert!(matches!(err, Error::Tag(_)), "{tag}");
        }
    }

    fn tags(new: &str, existing: &[&str]) -> Vec<String> {
        let existing: Vec<String> = existing.iter().map(|s| s.to_string()).collect();
        let mut got = oci_tags_to_update(&Version::parse(new).unwrap(), &existing);
        got.sort();
        got
    }

    fn sorted(v: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = v.iter().map(|s| s.to_string()).collect();
        v.sort();
        v
    }

    #[test]
    fn test_oci_tags_to_update() {
        let cases: [(&str, &[&str], &[&str]); 8] = [
            ("0.3.2", &["0.1.1", "0.2.0", "0.3.1"], &["0", "0.3.2", "0.3", "latest"]),
            ("1.0.0", &["0.1.1", "0.2.0", "0.3.1"], &["1", "1.0.0", "1.0", "latest"]),
            ("0.1.1", &["0.1.2", "0.2.0", "0.3.1"], &["0.1.1"]),
            ("0.1.3", &["0.1.2", "0.2.0", "0.3.1"], &["0.1.3", "0.1"]),
            (
                "1.0.2",
                &["0.1.2", "0.2.0", "1.0.0", "2.0.0", "2.0.2"],
                &["1", "1.0", "1.0.2"],
            ),
            ("0.1.4-rc1", &["0.1.2", "0.1.3"], &["0.1.4-rc1"]),
            (
                "1.0.2",
                &["1.0.0", "1.0.1", "2.0.0-rc1"],
                &["1", "1.0", "1.0.2", "latest"],
            ),
            (
                "1.0.2",
                &["1.0.0", "1.0.1", "2.0.0-rc1", "2.0.0"],
                &["1", "1.0", "1.0.2"],
            ),
        ];
        for (new, existing, want) in cases {
            assert_eq!(tags(new, existing), sorted(want), "{new} over {existing:?}");
        }
    }

    #[test]
    fn test_non_semver_existing_tags_ignored() {
        assert_eq!(
            tags("0.2.0", &["latest", "0.1", "garbage"]),
            sorted(&["0.2.0", "0.2", "0", "latest"])
        );
    }
}
