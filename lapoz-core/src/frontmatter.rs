//! Frontmatter extraction for content files.
//!
//! A content file may start with a `---` delimited YAML block:
//!
//! ```text
//! ---
//! title: Getting Started
//! description: First steps with the App Router
//! source: app/getting-started
//! related:
//!   title: Next steps
//!   links:
//!     - app/routing
//! ---
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^---([\s\S]*?)---").expect("valid frontmatter pattern"));
static TITLE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"title:\s*(.*)").expect("valid title pattern"));
static DESCRIPTION_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"description:\s*(.*)").expect("valid description pattern"));
static SOURCE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^source:\s*(.*)").expect("valid source pattern"));

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Frontmatter {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Reference to another page whose body is appended to this one.
    pub source: Option<String>,
    pub related: Option<Related>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Related {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

impl Frontmatter {
    /// Links listed under `related.links`, empty when absent.
    pub fn related_links(&self) -> &[String] {
        self.related.as_ref().map(|r| r.links.as_slice()).unwrap_or(&[])
    }
}

/// Separate the frontmatter block from the body.
pub fn split(source: &str) -> (Option<&str>, &str) {
    match BLOCK.captures(source) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let block = caps.get(1).map(|m| m.as_str());
            (block, &source[whole..])
        }
        None => (None, source),
    }
}

/// Parse the frontmatter of `source`, returning it with the remaining body.
pub fn parse(source: &str) -> (Frontmatter, &str) {
    let (block, body) = split(source);
    let frontmatter = block.map(parse_block).unwrap_or_default();
    (frontmatter, body)
}

fn parse_block(block: &str) -> Frontmatter {
    let trimmed = block.trim();
    if trimmed.is_empty() {
        return Frontmatter::default();
    }

    match serde_yaml::from_str::<Frontmatter>(trimmed) {
        Ok(frontmatter) => frontmatter,
        Err(e) => {
            tracing::debug!(error = %e, "frontmatter is not valid YAML, matching fields");
            Frontmatter {
                title: field(&TITLE_FIELD, block),
                description: field(&DESCRIPTION_FIELD, block),
                source: field(&SOURCE_FIELD, block),
                related: None,
            }
        }
    }
}

fn field(pattern: &Regex, block: &str) -> Option<String> {
    pattern
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}
