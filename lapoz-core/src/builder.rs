use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::config::Config;
use crate::scanner::{ScanError, SiteScanner};
use crate::site::{DocsSite, SiteError};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Source directory not specified")]
    MissingSourceDir,
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Render error: {0}")]
    Site(#[from] SiteError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct SiteBuilder {
    content_dir: Option<PathBuf>,
    output_dir: PathBuf,
    theme_dir: Option<PathBuf>,
    public_dir: Option<PathBuf>,
    config: Config,
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self {
            content_dir: None,
            output_dir: PathBuf::from("./out"),
            theme_dir: None,
            public_dir: None,
            config: Config::default(),
        }
    }

    // Required configuration
    pub fn content_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.content_dir = Some(path.as_ref().to_path_buf());
        self
    }

    // Optional paths
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn theme_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.theme_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn public_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.public_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<StaticSite, BuildError> {
        let content_dir = self.content_dir.ok_or(BuildError::MissingSourceDir)?;
        let site = DocsSite::new(&content_dir, self.config, self.theme_dir.as_deref())?;

        Ok(StaticSite {
            site,
            output_dir: self.output_dir,
            public_dir: self.public_dir,
        })
    }
}

/// Summary of a finished export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: usize,
    pub assets: usize,
}

pub struct StaticSite {
    site: DocsSite,
    output_dir: PathBuf,
    public_dir: Option<PathBuf>,
}

impl StaticSite {
    pub fn site(&self) -> &DocsSite {
        &self.site
    }

    /// Output file for a public route: `/docs/app` → `<out>/docs/app/index.html`.
    fn route_out_path(&self, route: &str) -> PathBuf {
        let mut path = self.output_dir.clone();
        for part in route.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path.join("index.html")
    }

    fn write(&self, path: &Path, html: &str) -> Result<(), BuildError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, html)?;
        Ok(())
    }

    pub fn render_all(&self) -> Result<BuildReport, BuildError> {
        std::fs::create_dir_all(&self.output_dir)?;

        let nav = self.site.nav_tree();
        let mut report = BuildReport::default();

        let home = self.site.render_home_with_nav(&nav)?;
        self.write(&self.output_dir.join("index.html"), &home)?;
        report.pages += 1;

        let entries = SiteScanner::new(self.site.content()).scan()?;
        let mut exported = HashSet::new();
        for entry in &entries {
            let route = self.site.route_for(&entry.slug);

            // Several files can clean to the same slug; only the one the
            // resolver serves is exported.
            let served = self.site.content().resolve_slug(&entry.slug);
            if served.as_deref() != Some(entry.source_path.as_path()) {
                tracing::warn!(
                    route = %route,
                    file = %entry.source_path.display(),
                    served = ?served,
                    "page shadowed by another entry"
                );
                continue;
            }
            if !exported.insert(entry.slug.clone()) {
                continue;
            }

            let html = self.site.render_doc_with_nav(&entry.slug, &nav)?;

            let out = self.route_out_path(&route);
            tracing::debug!(route = %route, out = %out.display(), "writing page");
            self.write(&out, &html)?;
            report.pages += 1;
        }

        let not_found = self.site.render_not_found_with_nav("/404", &nav)?;
        self.write(&self.output_dir.join("404.html"), &not_found)?;

        if let Some(public) = self.public_dir.as_deref().filter(|p| p.is_dir()) {
            report.assets = copy_dir(public, &self.output_dir)?;
        }

        tracing::info!(pages = report.pages, assets = report.assets, out = %self.output_dir.display(), "site built");
        Ok(report)
    }
}

fn copy_dir(from: &Path, to: &Path) -> Result<usize, BuildError> {
    let mut copied = 0;
    for entry in WalkDir::new(from).into_iter().filter_map(|e| e.ok()) {
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| BuildError::InvalidPath(entry.path().to_path_buf()))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
