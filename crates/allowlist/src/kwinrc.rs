//! Minimal editor for KDE-style grouped key/value files.
//!
//! `kwinrc` holds many unrelated groups; edits here touch only the target
//! `key=value` line (inserting the group header if absent) and leave every
//! other line untouched.

/// An in-memory, line-preserving view of a grouped config file.
pub(crate) struct GroupedFile {
    /// Raw lines, without trailing newlines.
    lines: Vec<String>,
}

/// Location of a `(group, key)` pair inside the file.
struct KeySite {
    /// Index of the `[group]` header line, if the group exists.
    group_line: Option<usize>,
    /// Index of the `key=` line, if the key exists inside the group.
    value_line: Option<usize>,
    /// Current value, empty if the key is absent.
    value: String,
}

impl GroupedFile {
    /// Parse file contents. An empty string yields an empty file.
    pub(crate) fn parse(contents: &str) -> Self {
        let lines = if contents.is_empty() {
            Vec::new()
        } else {
            contents.lines().map(str::to_string).collect()
        };
        Self { lines }
    }

    /// Locate `key` within `[group]`.
    fn find(&self, group: &str, key: &str) -> KeySite {
        let header = format!("[{group}]");
        let prefix = format!("{key}=");
        let mut in_group = false;
        let mut site = KeySite {
            group_line: None,
            value_line: None,
            value: String::new(),
        };

        for (i, line) in self.lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                in_group = trimmed == header;
                if in_group {
                    site.group_line = Some(i);
                }
                continue;
            }
            if in_group && let Some(rest) = trimmed.strip_prefix(&prefix) {
                site.value_line = Some(i);
                site.value = rest.to_string();
            }
        }
        site
    }

    /// Read the value of `key` within `[group]`, if present.
    pub(crate) fn get(&self, group: &str, key: &str) -> Option<String> {
        let site = self.find(group, key);
        site.value_line.map(|_| site.value)
    }

    /// Set `key=value` within `[group]`, creating group and key as needed.
    pub(crate) fn set(&mut self, group: &str, key: &str, value: &str) {
        let site = self.find(group, key);
        let new_line = format!("{key}={value}");
        match (site.group_line, site.value_line) {
            (Some(_), Some(at)) => self.lines[at] = new_line,
            (Some(header), None) => self.lines.insert(header + 1, new_line),
            (None, _) => {
                if self.lines.last().is_some_and(|l| !l.is_empty()) {
                    self.lines.push(String::new());
                }
                self.lines.push(format!("[{group}]"));
                self.lines.push(new_line);
            }
        }
    }

    /// Render back to file contents, one trailing newline per line.
    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
