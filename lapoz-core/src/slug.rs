//! Name normalization for numbered content entries.
//!
//! Content directories and files carry ordering prefixes (`01-app`,
//! `02_routing.mdx`) that never show up in public URLs.

use std::sync::LazyLock;

use regex::Regex;

static NUMERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[-_]?").expect("valid prefix pattern"));

/// Remove a leading `\d+[-_]?` ordering prefix from an entry name.
pub fn strip_numeric_prefix(name: &str) -> &str {
    match NUMERIC_PREFIX.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// Strip the ordering prefix from every part of a `/` separated route.
pub fn clean_route(path: &str) -> String {
    path.split('/')
        .map(strip_numeric_prefix)
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a URL segment can be used for a filesystem lookup. Hidden names,
/// `.` and `..` included, never are.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && !segment.contains('/')
        && !segment.contains('\\')
}

/// Split a `/` separated reference (`app/getting-started`) into segments.
pub fn split_reference(reference: &str) -> Vec<String> {
    reference
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
