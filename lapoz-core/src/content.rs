//! Slug resolution against the content directory.
//!
//! Public URLs use cleaned segments (`/docs/app/getting-started`) while the
//! files on disk keep their ordering prefixes (`01-app/01-getting-started.mdx`).
//! [`ContentDir`] maps one onto the other.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::frontmatter::{self, Frontmatter};
use crate::slug::{is_safe_segment, split_reference, strip_numeric_prefix};

pub const DEFAULT_EXTENSION: &str = "mdx";

#[derive(Debug, Clone)]
pub struct ContentDir {
    root: PathBuf,
    extension: String,
}

/// A resolved cross-link to another page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedLink {
    pub title: String,
    pub href: String,
}

impl ContentDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `index.<ext>`
    pub fn index_file_name(&self) -> String {
        format!("index.{}", self.extension)
    }

    /// Whether `name` is a content file name.
    pub fn is_content_file_name(&self, name: &str) -> bool {
        name.len() > self.extension.len() + 1
            && name.ends_with(&self.extension)
            && name[..name.len() - self.extension.len()].ends_with('.')
    }

    /// Strip the content extension from a file name, if present.
    pub fn file_stem<'a>(&self, name: &'a str) -> &'a str {
        if self.is_content_file_name(name) {
            &name[..name.len() - self.extension.len() - 1]
        } else {
            name
        }
    }

    /// Map cleaned URL segments back to the prefixed names found on disk.
    ///
    /// At the last segment a matching file wins over a matching directory.
    /// Segments with no match are kept literally.
    pub fn restore_original_slug(&self, cleaned: &[String]) -> Vec<String> {
        let mut current = self.root.clone();
        let mut result = Vec::with_capacity(cleaned.len());

        for (index, segment) in cleaned.iter().enumerate() {
            let entries = sorted_entries(&current);
            let is_last = index + 1 == cleaned.len();

            if is_last
                && let Some(file) = entries.iter().find(|(name, is_dir)| {
                    !*is_dir
                        && self.is_content_file_name(name)
                        && strip_numeric_prefix(self.file_stem(name)) == segment
                })
            {
                result.push(self.file_stem(&file.0).to_string());
                break;
            }

            let next = entries
                .iter()
                .find(|(name, is_dir)| *is_dir && strip_numeric_prefix(name) == segment)
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| segment.clone());

            current.push(&next);
            result.push(next);
        }

        result
    }

    /// Find the file for an on-disk slug.
    ///
    /// Tries `index.<ext>` for the empty slug, then `<slug>/index.<ext>`,
    /// then `<slug>.<ext>`.
    pub fn resolve_doc_file(&self, original: &[String]) -> Option<PathBuf> {
        let base = self.join(original);

        if original.is_empty() {
            let index = self.root.join(self.index_file_name());
            if index.is_file() {
                return Some(index);
            }
        }

        let index_in_dir = base.join(self.index_file_name());
        if index_in_dir.is_file() {
            return Some(index_in_dir);
        }

        if !original.is_empty() {
            let file = self.with_content_extension(&base);
            if file.is_file() {
                return Some(file);
            }
        }

        None
    }

    /// Resolve cleaned URL segments to a content file.
    pub fn resolve_slug(&self, cleaned: &[String]) -> Option<PathBuf> {
        if !cleaned.iter().all(|s| is_safe_segment(s)) {
            tracing::debug!(?cleaned, "rejecting unsafe slug");
            return None;
        }
        let original = self.restore_original_slug(cleaned);
        let resolved = self.resolve_doc_file(&original);
        tracing::debug!(?cleaned, ?original, ?resolved, "resolved slug");
        resolved
    }

    /// Turn a cleaned page reference (`app/getting-started`) into a file path.
    ///
    /// Prefers `<path>.<ext>`, then `<path>/index.<ext>`. When neither exists
    /// the first candidate is returned; callers check for existence.
    pub fn restore_source_path(&self, reference: &str) -> PathBuf {
        let segments = split_reference(reference);
        let restored = self.restore_original_slug(&segments);
        let base = self.join(&restored);

        let file = self.with_content_extension(&base);
        if file.is_file() {
            return file;
        }

        let index = base.join(self.index_file_name());
        if index.is_file() {
            return index;
        }

        file
    }

    pub fn frontmatter_for_slug(&self, cleaned: &[String]) -> Option<Frontmatter> {
        let path = self.resolve_slug(cleaned)?;
        read_frontmatter(&path)
    }

    pub fn title_for_slug(&self, cleaned: &[String]) -> Option<String> {
        self.frontmatter_for_slug(cleaned)?.title
    }

    pub fn description_for_slug(&self, cleaned: &[String]) -> Option<String> {
        self.frontmatter_for_slug(cleaned)?.description
    }

    /// Resolve `related.links` entries into titled links, dropping missing pages.
    pub fn resolve_related_links(&self, links: &[String], docs_route: &str) -> Vec<RelatedLink> {
        let mut result = Vec::new();

        for link in links {
            let path = self.restore_source_path(link);
            if !path.is_file() {
                tracing::warn!(link = %link, "related link does not resolve to a page");
                continue;
            }

            let title = read_frontmatter(&path)
                .and_then(|fm| fm.title)
                .unwrap_or_else(|| link.rsplit('/').next().unwrap_or_default().to_string());

            result.push(RelatedLink {
                title,
                href: format!("{}/{}", docs_route.trim_end_matches('/'), link.trim_matches('/')),
            });
        }

        result
    }

    fn join(&self, segments: &[String]) -> PathBuf {
        let mut path = self.root.clone();
        for segment in segments {
            path.push(segment);
        }
        path
    }

    fn with_content_extension(&self, base: &Path) -> PathBuf {
        let mut os = base.as_os_str().to_owned();
        os.push(".");
        os.push(&self.extension);
        PathBuf::from(os)
    }
}

/// Read and parse the frontmatter of a content file.
pub fn read_frontmatter(path: &Path) -> Option<Frontmatter> {
    match std::fs::read_to_string(path) {
        Ok(source) => Some(frontmatter::parse(&source).0),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read content file");
            None
        }
    }
}

/// Directory entries as `(name, is_dir)`, sorted by name.
fn sorted_entries(dir: &Path) -> Vec<(String, bool)> {
    let Ok(read) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut entries: Vec<(String, bool)> = read
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .map(|e| {
            let is_dir = e.path().is_dir();
            (e.file_name().to_string_lossy().to_string(), is_dir)
        })
        .collect();
    entries.sort();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn segs(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("index.mdx"), "---\ntitle: Welcome\n---\nroot").unwrap();
        fs::create_dir_all(root.join("01-app/01-getting-started")).unwrap();
        fs::write(
            root.join("01-app/index.mdx"),
            "---\ntitle: App Router\ndescription: The app directory\n---\n",
        )
        .unwrap();
        fs::write(
            root.join("01-app/01-getting-started/index.mdx"),
            "---\ntitle: Getting Started\n---\n",
        )
        .unwrap();
        fs::write(
            root.join("01-app/01-getting-started/02-installation.mdx"),
            "---\ntitle: Installation\n---\n",
        )
        .unwrap();
        fs::write(root.join("01-app/02-routing.mdx"), "no frontmatter").unwrap();
        fs::create_dir_all(root.join("02-pages")).unwrap();
        fs::write(root.join("02-pages/01-intro.mdx"), "---\ntitle: Pages\n---\n").unwrap();
        dir
    }

    #[test]
    fn restores_prefixed_directories_and_files() {
        let dir = fixture();
        let content = ContentDir::new(dir.path());
        assert_eq!(
            content.restore_original_slug(&segs(&["app", "getting-started", "installation"])),
            segs(&["01-app", "01-getting-started", "02-installation"])
        );
    }

    #[test]
    fn keeps_unmatched_segments_literally() {
        let dir = fixture();
        let content = ContentDir::new(dir.path());
        assert_eq!(
            content.restore_original_slug(&segs(&["app", "missing", "deeper"])),
            segs(&["01-app", "missing", "deeper"])
        );
    }

    #[test]
    fn final_file_match_beats_directory() {
        let dir = fixture();
        fs::create_dir_all(dir.path().join("01-app/02-routing")).unwrap();
        let content = ContentDir::new(dir.path());
        assert_eq!(
            content.restore_original_slug(&segs(&["app", "routing"])),
            segs(&["01-app", "02-routing"])
        );
        assert_eq!(
            content.resolve_slug(&segs(&["app", "routing"])),
            Some(dir.path().join("01-app/02-routing.mdx"))
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        let dir = fixture();
        let content = ContentDir::new(dir.path());
        assert_eq!(content.resolve_slug(&segs(&["App"])), None);
    }

    #[test]
    fn resolves_root_directory_index_and_file() {
        let dir = fixture();
        let content = ContentDir::new(dir.path());
        assert_eq!(content.resolve_slug(&[]), Some(dir.path().join("index.mdx")));
        assert_eq!(
            content.resolve_slug(&segs(&["app"])),
            Some(dir.path().join("01-app/index.mdx"))
        );
        assert_eq!(
            content.resolve_slug(&segs(&["pages", "intro"])),
            Some(dir.path().join("02-pages/01-intro.mdx"))
        );
        assert_eq!(content.resolve_slug(&segs(&["pages", "nope"])), None);
    }

    #[test]
    fn rejects_parent_directory_segments() {
        let dir = fixture();
        let content = ContentDir::new(dir.path().join("01-app"));
        assert_eq!(content.resolve_slug(&segs(&[".."])), None);
    }

    #[test]
    fn restores_source_paths_for_files_and_indexes() {
        let dir = fixture();
        let content = ContentDir::new(dir.path());
        assert_eq!(
            content.restore_source_path("app/routing"),
            dir.path().join("01-app/02-routing.mdx")
        );
        assert_eq!(
            content.restore_source_path("app/getting-started"),
            dir.path().join("01-app/01-getting-started/index.mdx")
        );
        assert_eq!(
            content.restore_source_path("app/unknown"),
            dir.path().join("01-app/unknown.mdx")
        );
    }

    #[test]
    fn reads_titles_and_descriptions() {
        let dir = fixture();
        let content = ContentDir::new(dir.path());
        assert_eq!(content.title_for_slug(&segs(&["app"])).as_deref(), Some("App Router"));
        assert_eq!(
            content.description_for_slug(&segs(&["app"])).as_deref(),
            Some("The app directory")
        );
        assert_eq!(content.title_for_slug(&segs(&["app", "routing"])), None);
        assert_eq!(content.title_for_slug(&segs(&["missing"])), None);
    }

    #[test]
    fn resolves_related_links_with_title_fallback() {
        let dir = fixture();
        let content = ContentDir::new(dir.path());
        let links = segs(&["app/getting-started/installation", "app/routing", "app/missing"]);
        assert_eq!(
            content.resolve_related_links(&links, "/docs"),
            vec![
                RelatedLink {
                    title: "Installation".into(),
                    href: "/docs/app/getting-started/installation".into(),
                },
                RelatedLink {
                    title: "routing".into(),
                    href: "/docs/app/routing".into(),
                },
            ]
        );
    }

    #[test]
    fn custom_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("01-intro.md"), "# Intro").unwrap();
        let content = ContentDir::new(dir.path()).with_extension(".md");
        assert_eq!(content.extension(), "md");
        assert_eq!(
            content.resolve_slug(&segs(&["intro"])),
            Some(dir.path().join("01-intro.md"))
        );
    }

    #[test]
    fn hidden_entries_are_never_resolved() {
        let dir = fixture();
        fs::create_dir_all(dir.path().join(".drafts")).unwrap();
        fs::write(dir.path().join(".drafts/secret.mdx"), "---\ntitle: Secret\n---\n").unwrap();
        fs::create_dir_all(dir.path().join("01-app/.05-internal")).unwrap();
        fs::write(dir.path().join("01-app/.05-internal/index.mdx"), "").unwrap();
        let content = ContentDir::new(dir.path());

        assert_eq!(content.resolve_slug(&segs(&[".drafts", "secret"])), None);
        assert_eq!(content.resolve_slug(&segs(&[".drafts"])), None);
        assert_eq!(
            content.restore_original_slug(&segs(&["app", ".05-internal"])),
            segs(&["01-app", ".05-internal"])
        );
        assert_eq!(content.resolve_slug(&segs(&["app", ".05-internal"])), None);
    }

    #[test]
    fn underscore_prefixes_are_restored() {
        let dir = fixture();
        fs::create_dir_all(dir.path().join("03_guides")).unwrap();
        fs::write(dir.path().join("03_guides/1_caching.mdx"), "---\ntitle: Caching\n---\n").unwrap();
        let content = ContentDir::new(dir.path());

        assert_eq!(
            content.restore_original_slug(&segs(&["guides", "caching"])),
            segs(&["03_guides", "1_caching"])
        );
        assert_eq!(
            content.resolve_slug(&segs(&["guides", "caching"])),
            Some(dir.path().join("03_guides/1_caching.mdx"))
        );
    }

    #[test]
    fn missing_intermediate_directories_fall_back_literally() {
        let dir = fixture();
        let content = ContentDir::new(dir.path());

        assert_eq!(
            content.restore_original_slug(&segs(&["nowhere", "getting-started", "installation"])),
            segs(&["nowhere", "getting-started", "installation"])
        );
        assert_eq!(
            content.resolve_slug(&segs(&["nowhere", "getting-started", "installation"])),
            None
        );
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directories_fall_back_literally() {
        use std::os::unix::fs::PermissionsExt;

        let dir = fixture();
        let locked = dir.path().join("01-app");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Permission bits are not enforced for root; only check the fallback when they are.
        let enforced = fs::read_dir(&locked).is_err();

        let content = ContentDir::new(dir.path());
        let restored = content.restore_original_slug(&segs(&["app", "routing"]));
        let resolved = content.resolve_slug(&segs(&["app", "routing"]));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if enforced {
            assert_eq!(restored, segs(&["01-app", "routing"]));
            assert_eq!(resolved, None);
        } else {
            assert_eq!(restored, segs(&["01-app", "02-routing"]));
        }
    }
}
