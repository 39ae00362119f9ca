//! Line-level outline of a rules file.
//!
//! A rules file is a top-level YAML sequence whose items start at column
//! zero with `- key: value`. The outline records, for each item, its first
//! key and value, the lines it spans and the comment block right above it.
//! Item boundaries come from layout; only the first `key: value` pair of
//! each item is read as YAML.

use serde_yaml::Value as Yaml;

/// One top-level sequence item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineItem {
    pub key: String,
    pub value: String,
    /// 1-based line of the `- key: value` start.
    pub first_line: usize,
    /// 1-based line of the last content line of the item.
    ///
    /// For a multi-line value this is the value's own last line, not the
    /// line where its last child node starts.
    pub last_line: usize,
    /// Last paragraph of the comment block directly above, lines verbatim.
    pub head_comment: String,
}

fn is_item_start(line: &str) -> bool {
    line == "-" || line.starts_with("- ")
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn is_content(line: &str) -> bool {
    !line.trim().is_empty() && !is_comment(line)
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

fn scalar(v: &Yaml) -> Option<String> {
    match v {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Split `- key: value` into key and scalar value.
///
/// The pair is read as a one-entry YAML mapping, so quoting, escapes and
/// trailing comments resolve the same way as in the parsed entity. Lines
/// that do not parse on their own (block scalar headers) fall back to a
/// plain split.
fn first_pair(line: &str) -> (String, String) {
    let rest = line.trim_start_matches('-').trim_start();
    if let Ok(Yaml::Mapping(m)) = serde_yaml::from_str::<Yaml>(rest) {
        if let Some((k, v)) = m.iter().next() {
            if let Some(key) = scalar(k) {
                return (key, scalar(v).unwrap_or_default());
            }
        }
    }
    match rest.split_once(':') {
        Some((k, v)) => (unquote(k).to_string(), unquote(v).to_string()),
        None => (unquote(rest).to_string(), String::new()),
    }
}

/// Comment block ending right above `start` (0-based), last paragraph only.
fn head_comment(lines: &[&str], start: usize) -> String {
    let mut block: Vec<&str> = Vec::new();
    for line in lines[..start].iter().rev() {
        if line.starts_with('#') || line.trim().is_empty() {
            block.push(*line);
        } else {
            break;
        }
    }
    block.reverse();

    // a blank line between comment and item detaches the comment
    if block.last().map_or(true, |l| l.trim().is_empty()) {
        return String::new();
    }
    let para_start = block
        .iter()
        .rposition(|l| l.trim().is_empty())
        .map_or(0, |i| i + 1);
    block[para_start..].join("\n")
}

/// Outline every top-level item of `source`.
pub fn outline(source: &str) -> Vec<OutlineItem> {
    let lines: Vec<&str> = source.lines().collect();
    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| is_item_start(l))
        .map(|(i, _)| i)
        .collect();

    let mut items = Vec::with_capacity(starts.len());
    for (n, &start) in starts.iter().enumerate() {
        // the item runs until the next top-level line that is not a comment
        let limit = starts.get(n + 1).copied().unwrap_or(lines.len());
        let mut end = start;
        for (i, line) in lines.iter().enumerate().take(limit).skip(start + 1) {
            if !line.starts_with([' ', '\t']) && is_content(line) {
                break;
            }
            if is_content(line) {
                end = i;
            }
        }
        let (key, value) = first_pair(lines[start]);
        items.push(OutlineItem {
            key,
            value,
            first_line: start + 1,
            last_line: end + 1,
            head_comment: head_comment(&lines, start),
        });
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
# Copyright header

# Shells everyone knows.
- list: shell_binaries
  items: [ash, bash, csh]

# First paragraph.

# Spawned shells.
# Second line.
- macro: spawned_process
  condition: >
    evt.type in (execve, execveat)
    # inside a folded scalar

- rule: \"Run shell untrusted\"
  desc: an attempt to spawn a shell
  condition: spawned_process and proc.name in (shell_binaries)
  priority: DEBUG
";

    #[test]
    fn test_positions() {
        let items = outline(SOURCE);
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].key, "list");
        assert_eq!(items[0].value, "shell_binaries");
        assert_eq!((items[0].first_line, items[0].last_line), (4, 5));

        assert_eq!(items[1].key, "macro");
        assert_eq!((items[1].first_line, items[1].last_line), (11, 13));

        assert_eq!(items[2].value, "Run shell untrusted");
        assert_eq!((items[2].first_line, items[2].last_line), (16, 19));
    }

    #[test]
    fn test_head_comments_keep_last_paragraph() {
        let items = outline(SOURCE);
        assert_eq!(items[0].head_comment, "# Shells everyone knows.");
        assert_eq!(items[1].head_comment, "# Spawned shells.\n# Second line.");
        assert_eq!(items[2].head_comment, "");
    }

    #[test]
    fn test_detached_comment_is_ignored() {
        let items = outline("# floating\n\n- list: l\n  items: []\n");
        assert_eq!(items[0].head_comment, "");
        assert_eq!(items[0].first_line, 3);
    }

    #[test]
    fn test_first_pair_resolves_yaml_scalars() {
        assert_eq!(
            first_pair("- list: foo  # the foo list"),
            ("list".to_string(), "foo".to_string())
        );
        assert_eq!(
            first_pair("- rule: 'Don''t run'"),
            ("rule".to_string(), "Don't run".to_string())
        );
        assert_eq!(
            first_pair(r#"- rule: "say \"hi\"""#),
            ("rule".to_string(), "say \"hi\"".to_string())
        );
        assert_eq!(
            first_pair("- required_engine_version: 13"),
            ("required_engine_version".to_string(), "13".to_string())
        );
        assert_eq!(
            first_pair("- required_plugin_versions:"),
            ("required_plugin_versions".to_string(), String::new())
        );
    }

    #[test]
    fn test_multiline_value_ends_on_its_last_line() {
        let items = outline("- list: foo\n  items:\n    - a\n    - b\n");
        assert_eq!((items[0].first_line, items[0].last_line), (1, 4));
    }

    #[test]
    fn test_trailing_comments_do_not_extend_item() {
        let items = outline("- list: a\n  items: [x]\n\n# about b\n- list: b\n");
        assert_eq!(items[0].last_line, 2);
        assert_eq!(items[1].head_comment, "# about b");
        assert_eq!((items[1].first_line, items[1].last_line), (5, 5));
    }
}
