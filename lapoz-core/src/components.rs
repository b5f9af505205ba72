//! Expansion of the JSX-style components used inside content files.
//!
//! Supported components:
//! - section gates such as `<AppOnly>…</AppOnly>`, kept only on pages of the
//!   matching section;
//! - `<Image src=… srcLight=… srcDark=… alt=… width=… height=… />`;
//! - the icon markers `<Check />`, `<Cross />`, `<Info />` and `<Alert />`;
//! - `{/* … */}` comments, which are dropped.
//!
//! Fenced code blocks and inline code spans are left untouched.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag};
use regex::{Captures, Regex};

use crate::markdown;

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{/\*.*?\*/\}").expect("valid comment pattern"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<Image\b(.*?)/>").expect("valid image pattern"));
static ICON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(Check|Cross|Info|Alert)\b[^>]*?/>").expect("valid icon pattern")
});
static CODE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").expect("valid placeholder pattern"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z][A-Za-z0-9_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|\{\s*["']?([^}"']*)["']?\s*\})"#)
        .expect("valid attribute pattern")
});

const DEFAULT_IMAGE_WIDTH: f64 = 800.0;
const DEFAULT_IMAGE_HEIGHT: f64 = 600.0;

/// Per-page settings for component expansion.
#[derive(Debug, Clone, Copy)]
pub struct ComponentContext<'a> {
    /// First cleaned URL segment of the page being rendered.
    pub section: Option<&'a str>,
    /// Gate component name → section it is visible in.
    pub gates: &'a BTreeMap<String, String>,
    /// Prefix for relative image sources.
    pub cdn_url: &'a str,
}

/// Expand every component in `body`, returning plain Markdown/HTML.
pub fn expand(body: &str, ctx: &ComponentContext<'_>) -> String {
    let (masked, code) = mask_code(body);
    let expanded = expand_components(&masked, ctx);
    unmask_code(&expanded, &code)
}

/// Byte ranges of fenced code blocks and inline code spans.
fn code_ranges(body: &str) -> Vec<Range<usize>> {
    Parser::new_ext(body, markdown::options())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) | Event::Code(_) => Some(range),
            _ => None,
        })
        .collect()
}

/// Swap code regions for numbered placeholders the component patterns
/// cannot match.
fn mask_code(body: &str) -> (String, Vec<&str>) {
    let mut masked = String::with_capacity(body.len());
    let mut code = Vec::new();
    let mut last = 0;

    for range in code_ranges(body) {
        if range.start < last {
            continue;
        }
        masked.push_str(&body[last..range.start]);
        masked.push_str(&format!("\u{E000}{}\u{E001}", code.len()));
        code.push(&body[range.clone()]);
        last = range.end;
    }
    masked.push_str(&body[last..]);

    (masked, code)
}

fn unmask_code(body: &str, code: &[&str]) -> String {
    if code.is_empty() {
        return body.to_string();
    }
    CODE_PLACEHOLDER
        .replace_all(body, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| code.get(index))
                .map(|original| original.to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

fn expand_components(body: &str, ctx: &ComponentContext<'_>) -> String {
    let mut out = COMMENT.replace_all(body, "").into_owned();

    for (gate, section) in ctx.gates {
        out = apply_gate(&out, gate, ctx.section == Some(section.as_str()));
    }

    out = IMAGE
        .replace_all(&out, |caps: &Captures| render_image(&caps[1], ctx.cdn_url))
        .into_owned();

    ICON.replace_all(&out, |caps: &Captures| {
        let name = caps[1].to_lowercase();
        format!("<span class=\"icon icon-{name}\" aria-hidden=\"true\"></span>")
    })
    .into_owned()
}

fn apply_gate(body: &str, gate: &str, visible: bool) -> String {
    let pattern = format!(r"(?s)<{0}\s*>(.*?)</{0}\s*>", regex::escape(gate));
    let Ok(re) = Regex::new(&pattern) else {
        tracing::warn!(gate = %gate, "invalid gate component name");
        return body.to_string();
    };

    re.replace_all(body, |caps: &Captures| {
        if visible {
            // Blank lines keep the inner content a Markdown block of its own.
            format!("\n\n{}\n\n", caps[1].trim_matches('\n'))
        } else {
            String::new()
        }
    })
    .into_owned()
}

fn parse_attributes(raw: &str) -> BTreeMap<String, String> {
    ATTRIBUTE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_string();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

fn attribute<'a>(attrs: &'a BTreeMap<String, String>, key: &str) -> &'a str {
    attrs.get(key).map(String::as_str).unwrap_or_default()
}

/// Absolute URLs pass through; anything else gets the CDN prefix.
pub fn normalize_src(src: &str, cdn_url: &str) -> String {
    if src.is_empty() {
        return String::new();
    }
    if src.starts_with("http") {
        return src.to_string();
    }
    format!("{cdn_url}{src}")
}

/// A numeric attribute; missing, zero or unparsable values use the default.
fn dimension(raw: &str, default: f64) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value != 0.0 => value,
        _ => default,
    }
}

fn render_image(raw_attributes: &str, cdn_url: &str) -> String {
    let attrs = parse_attributes(raw_attributes);

    let light = match attribute(&attrs, "srcLight") {
        "" => attribute(&attrs, "src"),
        src_light => src_light,
    };
    let light = normalize_src(light, cdn_url);
    let dark = normalize_src(attribute(&attrs, "srcDark"), cdn_url);
    let src = if dark.is_empty() { light } else { dark };

    let width = dimension(attribute(&attrs, "width"), DEFAULT_IMAGE_WIDTH);
    let height = dimension(attribute(&attrs, "height"), DEFAULT_IMAGE_HEIGHT);

    format!(
        "<div class=\"mdx-image\"><img src=\"{}\" alt=\"{}\" width=\"{}\" height=\"{}\" loading=\"lazy\" /></div>",
        html_escape::encode_double_quoted_attribute(&src),
        html_escape::encode_double_quoted_attribute(attribute(&attrs, "alt")),
        width,
        height
    )
}
