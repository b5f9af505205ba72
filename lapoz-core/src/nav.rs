//! Sidebar navigation tree.

use std::cmp::Ordering;
use std::path::Path;

use serde::Serialize;

use crate::content::{ContentDir, read_frontmatter};
use crate::slug::{clean_route, strip_numeric_prefix};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavNode {
    pub title: String,
    /// Route built from the on-disk names, prefixes included. `None` for
    /// directories without an index page.
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavNode>,
}

impl NavNode {
    /// Public link for this node.
    pub fn href(&self) -> Option<String> {
        self.path.as_deref().map(clean_route)
    }
}

/// Build the navigation tree for the whole content directory.
///
/// A root `index` page becomes the first node, linked to `docs_route` and
/// titled `intro_title` unless its frontmatter says otherwise.
pub fn build_nav_tree(content: &ContentDir, docs_route: &str, intro_title: &str) -> Vec<NavNode> {
    let mut nodes = Vec::new();
    let docs_route = docs_route.trim_end_matches('/');

    let root_index = content.root().join(content.index_file_name());
    if root_index.is_file() {
        let title = read_frontmatter(&root_index)
            .and_then(|fm| fm.title)
            .unwrap_or_else(|| intro_title.to_string());
        nodes.push(NavNode {
            title,
            path: Some(docs_route.to_string()),
            children: Vec::new(),
        });
    }

    nodes.extend(walk(content, content.root(), docs_route));
    nodes
}

fn walk(content: &ContentDir, dir: &Path, base_route: &str) -> Vec<NavNode> {
    let read = match std::fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return Vec::new();
        }
    };

    let mut entries: Vec<_> = read
        .filter_map(|e| e.ok())
        .map(|e| (e.file_name().to_string_lossy().to_string(), e.path()))
        .filter(|(name, _)| !name.starts_with('.'))
        .collect();
    entries.sort_by(|a, b| natural_cmp(&a.0, &b.0));

    let index_name = content.index_file_name();
    let mut nodes = Vec::new();

    for (name, path) in entries {
        if path.is_dir() {
            let route = format!("{base_route}/{name}");
            let children = walk(content, &path, &route);
            let fallback = format_title(strip_numeric_prefix(&name));
            let index = path.join(&index_name);

            let (title, node_path) = if index.is_file() {
                let title = read_frontmatter(&index)
                    .and_then(|fm| fm.title)
                    .unwrap_or(fallback);
                (title, Some(route))
            } else {
                (fallback, None)
            };

            nodes.push(NavNode {
                title,
                path: node_path,
                children,
            });
        } else if path.is_file() && content.is_content_file_name(&name) && name != index_name {
            let stem = content.file_stem(&name);
            let title = read_frontmatter(&path)
                .and_then(|fm| fm.title)
                .unwrap_or_else(|| format_title(strip_numeric_prefix(stem)));
            nodes.push(NavNode {
                title,
                path: Some(format!("{base_route}/{stem}")),
                children: Vec::new(),
            });
        }
    }

    nodes
}

/// `getting-started` → `Getting started`
pub fn format_title(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('-', " "),
        None => String::new(),
    }
}

/// Compare names the way a human orders numbered files: digit runs compare
/// by value, everything else case-insensitively.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u128>(), r.parse::<u128>()) {
                    (Ok(ln), Ok(rn)) => ln.cmp(&rn).then_with(|| l.len().cmp(&r.len())),
                    _ => l.to_lowercase().cmp(&r.to_lowercase()),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digit)
            .map_or(rest.len(), |(i, _)| i);
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

/// Render the tree as nested lists, marking the node linked to `current_path`.
pub fn render_sidebar(nodes: &[NavNode], current_path: &str) -> String {
    let mut html = String::new();
    render_level(&mut html, nodes, current_path.trim_end_matches('/'), 0);
    html
}

fn render_level(html: &mut String, nodes: &[NavNode], current: &str, level: usize) {
    let list_class = if level == 0 { "nav-tree" } else { "nav-tree nav-nested" };
    html.push_str(&format!("<ul class=\"{list_class}\">\n"));

    for node in nodes {
        html.push_str("<li>");
        match node.href() {
            Some(href) => {
                let mut class = match level {
                    0 => "nav-link nav-section".to_string(),
                    1 => "nav-link nav-group".to_string(),
                    _ => "nav-link nav-item".to_string(),
                };
                if href == current {
                    class.push_str(" active");
                }
                html.push_str(&format!(
                    "<a href=\"{}\" class=\"{}\">{}</a>",
                    html_escape::encode_double_quoted_attribute(&href),
                    class,
                    html_escape::encode_text(&node.title)
                ));
            }
            None => {
                html.push_str(&format!(
                    "<span class=\"nav-label\">{}</span>",
                    html_escape::encode_text(&node.title)
                ));
            }
        }

        if !node.children.is_empty() {
            html.push('\n');
            render_level(html, &node.children, current, level + 1);
        }
        html.push_str("</li>\n");
    }

    html.push_str("</ul>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn leaf(title: &str, path: &str) -> NavNode {
        NavNode {
            title: title.into(),
            path: Some(path.into()),
            children: Vec::new(),
        }
    }

    #[test]
    fn formats_display_names() {
        assert_eq!(format_title("getting-started"), "Getting started");
        assert_eq!(format_title("árnyék-dom"), "Árnyék dom");
        assert_eq!(format_title(""), "");
    }

    #[test]
    fn orders_numbers_by_value() {
        let mut names = vec!["10-ten", "2-two", "01-one", "b", "A"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["01-one", "2-two", "10-ten", "A", "b"]);
    }

    #[test]
    fn builds_tree_from_numbered_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("index.mdx"), "# root").unwrap();
        fs::create_dir_all(root.join("01-app/10-api")).unwrap();
        fs::create_dir_all(root.join("01-app/2-guides")).unwrap();
        fs::write(root.join("01-app/index.mdx"), "---\ntitle: App Router\n---\n").unwrap();
        fs::write(root.join("01-app/01-getting-started.mdx"), "---\ntitle: Start here\n---\n")
            .unwrap();
        fs::write(root.join("01-app/2-guides/01-data-fetching.mdx"), "text").unwrap();
        fs::write(root.join("01-app/10-api/readme.txt"), "ignored").unwrap();
        fs::write(root.join(".hidden.mdx"), "ignored").unwrap();

        let content = ContentDir::new(root);
        let tree = build_nav_tree(&content, "/docs", "Introduction");

        assert_eq!(
            tree,
            vec![
                leaf("Introduction", "/docs"),
                NavNode {
                    title: "App Router".into(),
                    path: Some("/docs/01-app".into()),
                    children: vec![
                        leaf("Start here", "/docs/01-app/01-getting-started"),
                        NavNode {
                            title: "Guides".into(),
                            path: None,
                            children: vec![leaf(
                                "Data fetching",
                                "/docs/01-app/2-guides/01-data-fetching"
                            )],
                        },
                        NavNode {
                            title: "Api".into(),
                            path: None,
                            children: Vec::new(),
                        },
                    ],
                },
            ]
        );
        assert_eq!(
            tree[1].children[1].children[0].href().as_deref(),
            Some("/docs/app/guides/data-fetching")
        );
    }

    #[test]
    fn sidebar_marks_active_link_and_plain_labels() {
        let tree = vec![NavNode {
            title: "App <Router>".into(),
            path: Some("/docs/01-app".into()),
            children: vec![
                leaf("Routing", "/docs/01-app/02-routing"),
                NavNode {
                    title: "Guides".into(),
                    path: None,
                    children: Vec::new(),
                },
            ],
        }];

        let html = render_sidebar(&tree, "/docs/app/routing/");
        assert!(html.contains(
            "<a href=\"/docs/app/routing\" class=\"nav-link nav-group active\">Routing</a>"
        ));
        assert!(html.contains(
            "<a href=\"/docs/app\" class=\"nav-link nav-section\">App &lt;Router&gt;</a>"
        ));
        assert!(html.contains("<span class=\"nav-label\">Guides</span>"));
        assert!(html.contains("<ul class=\"nav-tree nav-nested\">"));
    }
}
