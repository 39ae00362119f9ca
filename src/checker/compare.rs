//! Comparison primitives used by the change classifiers.

use semver::Version;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

/// Rule priorities, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Informational,
    Debug,
}

impl Priority {
    pub const ALL: [Priority; 8] = [
        Priority::Emergency,
        Priority::Alert,
        Priority::Critical,
        Priority::Error,
        Priority::Warning,
        Priority::Notice,
        Priority::Informational,
        Priority::Debug,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Emergency => "emergency",
            Priority::Alert => "alert",
            Priority::Critical => "critical",
            Priority::Error => "error",
            Priority::Warning => "warning",
            Priority::Notice => "notice",
            Priority::Informational => "informational",
            Priority::Debug => "debug",
        }
    }

    /// Resolve a priority by case-insensitive prefix (`info` -> informational).
    ///
    /// When several levels share the prefix the least urgent one wins.
    pub fn resolve(s: &str) -> Option<Priority> {
        let needle = s.to_lowercase();
        Priority::ALL
            .iter()
            .rev()
            .find(|p| p.as_str().starts_with(&needle))
            .copied()
    }
}

/// Three-way comparison of two integers.
pub fn compare_int(a: i64, b: i64) -> Ordering {
    a.cmp(&b)
}

/// `Greater` when `left` is more urgent than `right`, `Less` when less urgent.
///
/// Unknown priorities rank below every known level; two unknowns are equal.
pub fn compare_priorities(left: &str, right: &str) -> Ordering {
    let rank = |s: &str| Priority::resolve(s).map_or(usize::MAX, |p| p as usize);
    // lower rank is more urgent
    rank(right).cmp(&rank(left))
}

/// Elements of `left` that do not appear in `right`, deduplicated and sorted.
pub fn diff_str_set<'a>(left: &'a [String], right: &[String]) -> BTreeSet<&'a str> {
    let right: HashSet<&str> = right.iter().map(String::as_str).collect();
    left.iter()
        .map(String::as_str)
        .filter(|s| !right.contains(s))
        .collect()
}

/// True when the two slices hold different sets of values.
pub fn sets_differ(left: &[String], right: &[String]) -> bool {
    !diff_str_set(left, right).is_empty() || !diff_str_set(right, left).is_empty()
}

/// Engine version as semver; a bare integer `n` means `0.n.0`.
pub fn parse_engine_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    if let Ok(v) = Version::parse(raw) {
        return Some(v);
    }
    raw.parse::<u64>().ok().map(|minor| Version::new(0, minor, 0))
}

/// Compare two engine versions; unparsable values count as `0.0.0`.
pub fn compare_engine_versions(left: &str, right: &str) -> Ordering {
    let zero = Version::new(0, 0, 0);
    let l = parse_engine_version(left).unwrap_or_else(|| zero.clone());
    let r = parse_engine_version(right).unwrap_or(zero);
    l.cmp(&r)
}

/// Compare two plugin versions, `None` when either is not valid semver.
pub fn compare_plugin_versions(left: &str, right: &str) -> Option<Ordering> {
    let l = Version::parse(left.trim()).ok()?;
    let r = Version::parse(right.trim()).ok()?;
    Some(l.cmp(&r))
}
