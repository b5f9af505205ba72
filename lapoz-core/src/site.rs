//! Page assembly: resolved file, frontmatter, components, Markdown, layout.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::Context;
use thiserror::Error;

use crate::components::{self, ComponentContext};
use crate::config::Config;
use crate::content::{ContentDir, RelatedLink};
use crate::frontmatter::{self, Frontmatter};
use crate::markdown::{self, TocEntry};
use crate::nav::{self, NavNode};
use crate::template::{TemplateError, TemplateRenderer};

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Page not found: {0}")]
    NotFound(String),
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub title: String,
    pub href: String,
    pub current: bool,
}

/// A documentation page ready for layout.
#[derive(Debug, Clone, Serialize)]
pub struct DocPage {
    /// Cleaned URL segments.
    pub slug: Vec<String>,
    pub source_path: PathBuf,
    pub frontmatter: Frontmatter,
    /// Public route of the page.
    pub route: String,
    pub content: String,
    /// Body of the page referenced by the `source` frontmatter field.
    pub extra_content: Option<String>,
    pub related_links: Vec<RelatedLink>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub toc: Vec<TocEntry>,
}

/// Title and description for the document head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
}

pub struct DocsSite {
    content: ContentDir,
    config: Config,
    templates: TemplateRenderer,
}

impl DocsSite {
    pub fn new(content_dir: &Path, config: Config, theme_dir: Option<&Path>) -> Result<Self, SiteError> {
        let content = ContentDir::new(content_dir).with_extension(config.docs.extension.clone());
        let templates = TemplateRenderer::new(theme_dir)?;

        Ok(Self {
            content,
            config,
            templates,
        })
    }

    pub fn content(&self) -> &ContentDir {
        &self.content
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn nav_tree(&self) -> Vec<NavNode> {
        nav::build_nav_tree(&self.content, &self.config.docs.route(), &self.config.docs.intro_title)
    }

    /// Public route for cleaned segments.
    pub fn route_for(&self, cleaned: &[String]) -> String {
        let base = self.config.docs.route();
        if cleaned.is_empty() {
            if base.is_empty() { "/".to_string() } else { base }
        } else {
            format!("{}/{}", base, cleaned.join("/"))
        }
    }

    /// Title and description of a page, with the site defaults as fallback.
    pub fn metadata_for(&self, cleaned: &[String]) -> PageMetadata {
        let frontmatter = self.content.frontmatter_for_slug(cleaned).unwrap_or_default();
        PageMetadata {
            title: self.config.site.page_title(frontmatter.title.as_deref()),
            description: frontmatter
                .description
                .unwrap_or_else(|| self.config.site.description.clone()),
        }
    }

    /// One crumb for the docs root, then one per slug prefix. The last one is
    /// the current page.
    pub fn breadcrumbs(&self, cleaned: &[String]) -> Vec<Breadcrumb> {
        let mut crumbs = vec![Breadcrumb {
            title: self.config.docs.breadcrumb_root.clone(),
            href: self.route_for(&[]),
            current: false,
        }];

        for index in 0..cleaned.len() {
            let prefix = &cleaned[..=index];
            let title = self
                .content
                .title_for_slug(prefix)
                .unwrap_or_else(|| cleaned[index].clone());
            crumbs.push(Breadcrumb {
                title,
                href: self.route_for(prefix),
                current: index + 1 == cleaned.len(),
            });
        }

        crumbs
    }

    /// Load and render the page for cleaned URL segments.
    pub fn doc_page(&self, cleaned: &[String]) -> Result<DocPage, SiteError> {
        let route = self.route_for(cleaned);
        let path = self
            .content
            .resolve_slug(cleaned)
            .ok_or_else(|| SiteError::NotFound(route.clone()))?;

        let source = read(&path)?;
        let (frontmatter, body) = frontmatter::parse(&source);

        let components = ComponentContext {
            section: cleaned.first().map(String::as_str),
            gates: &self.config.docs.gates,
            cdn_url: &self.config.site.cdn_url,
        };

        let rendered = self.render_body(body, &components);

        let extra_content = match frontmatter.source.as_deref() {
            Some(reference) => {
                let extra_path = self.content.restore_source_path(reference);
                if extra_path.is_file() {
                    let extra_source = read(&extra_path)?;
                    let (_, extra_body) = frontmatter::parse(&extra_source);
                    Some(self.render_body(extra_body, &components).html)
                } else {
                    tracing::warn!(page = %route, source = %reference, "source reference not found");
                    None
                }
            }
            None => None,
        };

        let related_links = self
            .content
            .resolve_related_links(frontmatter.related_links(), &self.config.docs.route());

        Ok(DocPage {
            slug: cleaned.to_vec(),
            source_path: path,
            breadcrumbs: self.breadcrumbs(cleaned),
            frontmatter,
            route,
            content: rendered.html,
            extra_content,
            related_links,
            toc: rendered.toc,
        })
    }

    fn render_body(&self, body: &str, components: &ComponentContext<'_>) -> markdown::RenderedMarkdown {
        let expanded = components::expand(body, components);
        markdown::render(&expanded, &self.config.site.syntax_theme)
    }

    /// Full HTML document for a documentation page.
    pub fn render_doc(&self, cleaned: &[String]) -> Result<String, SiteError> {
        self.render_doc_with_nav(cleaned, &self.nav_tree())
    }

    pub fn render_doc_with_nav(&self, cleaned: &[String], nav: &[NavNode]) -> Result<String, SiteError> {
        let page = self.doc_page(cleaned)?;
        let metadata = PageMetadata {
            title: self.config.site.page_title(page.frontmatter.title.as_deref()),
            description: page
                .frontmatter
                .description
                .clone()
                .unwrap_or_else(|| self.config.site.description.clone()),
        };

        let mut context = self.base_context(&metadata, &page.route, nav);
        context.insert("page", &page);

        Ok(self.templates.render("doc.html", &context)?)
    }

    pub fn render_home(&self) -> Result<String, SiteError> {
        self.render_home_with_nav(&self.nav_tree())
    }

    pub fn render_home_with_nav(&self, nav: &[NavNode]) -> Result<String, SiteError> {
        let site = &self.config.site;
        let home = &self.config.home;
        let metadata = PageMetadata {
            title: site.title.clone(),
            description: site.description.clone(),
        };

        let mut context = self.base_context(&metadata, "/", nav);
        context.insert("home", home);
        context.insert("heading", home.heading.as_deref().unwrap_or(&site.title));
        context.insert("tagline", home.tagline.as_deref().unwrap_or(&site.description));

        Ok(self.templates.render("home.html", &context)?)
    }

    pub fn render_not_found(&self, current_path: &str) -> Result<String, SiteError> {
        self.render_not_found_with_nav(current_path, &self.nav_tree())
    }

    pub fn render_not_found_with_nav(&self, current_path: &str, nav: &[NavNode]) -> Result<String, SiteError> {
        let not_found = &self.config.not_found;
        let metadata = PageMetadata {
            title: not_found.title.clone(),
            description: not_found.message.clone(),
        };

        let mut context = self.base_context(&metadata, current_path, nav);
        context.insert("not_found", not_found);
        context.insert("robots", "noindex, nofollow");

        Ok(self.templates.render("not_found.html", &context)?)
    }

    fn base_context(&self, metadata: &PageMetadata, current_path: &str, nav: &[NavNode]) -> Context {
        let site = &self.config.site;
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("page_title", &metadata.title);
        context.insert("description", &metadata.description);
        context.insert("robots", &Option::<String>::None);
        context.insert(
            "canonical_url",
            &site
                .base_url
                .as_deref()
                .map(|base| format!("{}{}", base.trim_end_matches('/'), current_path)),
        );
        context.insert("sidebar", &nav::render_sidebar(nav, current_path));
        context
    }
}

fn read(path: &Path) -> Result<String, SiteError> {
    std::fs::read_to_string(path).map_err(|source| SiteError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Split a request path below the docs route into cleaned segments.
pub fn slug_from_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
