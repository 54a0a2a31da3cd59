//! Class-key normalization.
//!
//! Stored entries keep the user's spelling; all membership comparison goes
//! through [`normalize`], which is total and idempotent.

use std::collections::HashSet;

/// Normalize a raw window-class identifier into its comparison key.
///
/// Trims whitespace, lower-cases, and strips trailing `.desktop` suffixes
/// (KWin reports `desktopFileName` with the suffix, `resourceClass`
/// without). An empty input yields the empty key, which never matches.
pub fn normalize(raw: &str) -> String {
    let mut key = raw.trim().to_lowercase();
    while let Some(stripped) = key.strip_suffix(".desktop") {
        key = stripped.to_string();
    }
    key
}

/// Split a stored value into class names, dropping empties and
/// de-duplicating by normalized key while preserving first-seen order and
/// original spelling.
pub fn parse_list(raw: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();
    for token in raw.split(|c: char| c == ';' || c == ',' || c.is_whitespace()) {
        let token = token.trim();
        let key = normalize(token);
        if key.is_empty() {
            continue;
        }
        if seen.insert(key) {
            out.push(token.to_string());
        }
    }
    out
}

/// Join class names into the stored single-value form.
pub fn join_list(classes: &[String]) -> String {
    classes.join(";")
}
