use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::DEFAULT_EXTENSION;
use crate::markdown::DEFAULT_SYNTAX_THEME;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parsing(#[from] toml::de::Error),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub docs: DocsConfig,
    pub home: HomeConfig,
    pub not_found: NotFoundConfig,
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&data)?;

        Ok(config)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    /// Page title template, `%s` is replaced by the page title.
    pub title_template: String,
    pub description: String,
    pub base_url: Option<String>,
    /// Open Graph locale, e.g. `hu_HU`.
    pub locale: String,
    /// `lang` attribute of the document.
    pub lang: String,
    /// Prefix for relative image sources in content.
    pub cdn_url: String,
    pub syntax_theme: String,
    pub favicon: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Documentation".into(),
            title_template: "%s | Documentation".into(),
            description: "Project documentation".into(),
            base_url: None,
            locale: "en_US".into(),
            lang: "en".into(),
            cdn_url: String::new(),
            syntax_theme: DEFAULT_SYNTAX_THEME.into(),
            favicon: Some("/favicon.ico".into()),
        }
    }
}

impl SiteConfig {
    /// Full document title for a page.
    pub fn page_title(&self, title: Option<&str>) -> String {
        match title {
            Some(title) => self.title_template.replace("%s", title),
            None => self.title.clone(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DocsConfig {
    /// URL prefix the documentation is served under.
    pub route: String,
    /// Extension of content files, without the dot.
    pub extension: String,
    /// Sidebar title of the root index page when it has none.
    pub intro_title: String,
    /// Label of the first breadcrumb.
    pub breadcrumb_root: String,
    /// Gate component name → first URL segment it is shown for.
    pub gates: BTreeMap<String, String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            route: "/docs".into(),
            extension: DEFAULT_EXTENSION.into(),
            intro_title: "Introduction".into(),
            breadcrumb_root: "Docs".into(),
            gates: BTreeMap::from([
                ("AppOnly".to_string(), "app".to_string()),
                ("PagesOnly".to_string(), "pages".to_string()),
            ]),
        }
    }
}

impl DocsConfig {
    /// The route with a single leading slash and no trailing one; `/` maps
    /// to the empty string.
    pub fn route(&self) -> String {
        match self.route.trim().trim_matches('/') {
            "" => String::new(),
            route => format!("/{route}"),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HomeConfig {
    pub heading: Option<String>,
    pub tagline: Option<String>,
    pub actions: Vec<Link>,
    pub footer: Option<String>,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            heading: None,
            tagline: None,
            actions: vec![Link {
                text: "Read the docs".into(),
                link: "/docs".into(),
                primary: true,
            }],
            footer: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NotFoundConfig {
    pub title: String,
    pub heading: String,
    pub message: String,
    pub actions: Vec<Link>,
}

impl Default for NotFoundConfig {
    fn default() -> Self {
        Self {
            title: "404 - Page not found".into(),
            heading: "Page not found".into(),
            message: "The page you are looking for does not exist or has been moved.".into(),
            actions: vec![
                Link {
                    text: "Back to the home page".into(),
                    link: "/".into(),
                    primary: true,
                },
                Link {
                    text: "Go to the documentation".into(),
                    link: "/docs".into(),
                    primary: false,
                },
            ],
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Link {
    pub text: String,
    pub link: String,
    #[serde(default)]
    pub primary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.docs.route(), "/docs");
        assert_eq!(config.docs.gates.get("AppOnly").map(String::as_str), Some("app"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [site]
            title = "Next.js Magyar Dokumentáció"
            title_template = "%s | Next.js Magyar Dokumentáció"
            lang = "hu"

            [docs]
            intro_title = "Bevezetés"

            [[home.actions]]
            text = "App Router"
            link = "/docs/app"
            primary = true
            "#,
        )
        .unwrap();

        assert_eq!(config.site.lang, "hu");
        assert_eq!(config.site.locale, "en_US");
        assert_eq!(config.docs.intro_title, "Bevezetés");
        assert_eq!(config.docs.extension, "mdx");
        assert_eq!(config.home.actions.len(), 1);
        assert_eq!(
            config.site.page_title(Some("Telepítés")),
            "Telepítés | Next.js Magyar Dokumentáció"
        );
        assert_eq!(config.site.page_title(None), "Next.js Magyar Dokumentáció");
    }

    #[test]
    fn read_reports_missing_file() {
        let err = Config::read("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn docs_route_is_normalized() {
        let mut docs = DocsConfig::default();
        for (raw, route) in [("docs", "/docs"), ("/docs/", "/docs"), ("kezikonyv/v2/", "/kezikonyv/v2"), ("/", ""), ("", "")] {
            docs.route = raw.to_string();
            assert_eq!(docs.route(), route, "route {raw:?}");
        }
    }
}
