use std::collections::HashMap;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use serde::Serialize;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

// Initialize syntax highlighting resources once
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

pub const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub title: String,
    pub id: String,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedMarkdown {
    pub html: String,
    /// Headings of level 2 and below, in document order.
    pub toc: Vec<TocEntry>,
}

pub(crate) fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Render a Markdown body (frontmatter already removed) to HTML.
pub fn render(body: &str, syntax_theme: &str) -> RenderedMarkdown {
    let events: Vec<Event> = Parser::new_ext(body, options()).collect();
    let mut processed = Vec::with_capacity(events.len());
    let mut toc = Vec::new();
    let mut used_ids: HashMap<String, usize> = HashMap::new();
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.split_whitespace().next().unwrap_or(""),
                    CodeBlockKind::Indented => "",
                };

                // Collect all text events until the end of the code block
                let mut code = String::new();
                i += 1;
                while i < events.len() {
                    match &events[i] {
                        Event::End(TagEnd::CodeBlock) => break,
                        Event::Text(text) => code.push_str(text),
                        _ => {}
                    }
                    i += 1;
                }

                processed.push(Event::Html(highlight(&code, lang, syntax_theme).into()));
            }
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let start = i;
                let mut text = String::new();
                let mut end = start + 1;
                while end < events.len() {
                    match &events[end] {
                        Event::End(TagEnd::Heading(_)) => break,
                        Event::Text(t) | Event::Code(t) => text.push_str(t),
                        _ => {}
                    }
                    end += 1;
                }

                let base = match id {
                    Some(explicit) => explicit.to_string(),
                    None => slugify(&text),
                };
                let anchor = unique_id(&mut used_ids, base);
                let level_num = *level as u8;
                if level_num >= 2 {
                    toc.push(TocEntry {
                        level: level_num,
                        title: text.trim().to_string(),
                        id: anchor.clone(),
                    });
                }

                processed.push(Event::Start(Tag::Heading {
                    level: *level,
                    id: Some(anchor.into()),
                    classes: classes.clone(),
                    attrs: attrs.clone(),
                }));
                processed.extend(events[start + 1..end.min(events.len())].iter().cloned());
                if end < events.len() {
                    processed.push(events[end].clone());
                }
                i = end;
            }
            event => processed.push(event.clone()),
        }
        i += 1;
    }

    let mut out = String::new();
    html::push_html(&mut out, processed.into_iter());

    RenderedMarkdown { html: out, toc }
}

fn unique_id(used: &mut HashMap<String, usize>, base: String) -> String {
    let base = if base.is_empty() { "section".to_string() } else { base };
    let count = used.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 { base } else { format!("{}-{}", base, *count - 1) }
}

fn theme(name: &str) -> Option<&'static Theme> {
    THEME_SET
        .themes
        .get(name)
        .or_else(|| THEME_SET.themes.get(DEFAULT_SYNTAX_THEME))
}

/// Highlight a code block, falling back to escaped plain text.
pub fn highlight(code: &str, lang: &str, syntax_theme: &str) -> String {
    let plain = || format!("<pre><code>{}</code></pre>\n", html_escape::encode_text(code));
    if lang.is_empty() {
        return plain();
    }

    let syntax = SYNTAX_SET.find_syntax_by_token(lang).or_else(|| {
        // Fallback mappings for unsupported languages
        match lang {
            "jsx" | "ts" | "tsx" | "typescript" | "mjs" => SYNTAX_SET.find_syntax_by_name("JavaScript"),
            "toml" => SYNTAX_SET.find_syntax_by_name("YAML"),
            "sh" | "shell" | "terminal" => SYNTAX_SET.find_syntax_by_name("Bourne Again Shell (bash)"),
            _ => None,
        }
    });

    match (syntax, theme(syntax_theme)) {
        (Some(syntax), Some(theme)) => highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme)
            .unwrap_or_else(|_| plain()),
        _ => plain(),
    }
}

/// Anchor id for a heading: lower-case alphanumerics joined by single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
