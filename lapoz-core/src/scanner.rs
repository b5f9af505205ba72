use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::content::ContentDir;
use crate::slug::strip_numeric_prefix;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Content directory does not exist: {}", .0.display())]
    MissingRoot(PathBuf),
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// A content file and the cleaned slug it is served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocEntry {
    pub source_path: PathBuf,
    pub slug: Vec<String>,
}

pub struct SiteScanner<'a> {
    content: &'a ContentDir,
}

impl<'a> SiteScanner<'a> {
    pub fn new(content: &'a ContentDir) -> Self {
        Self { content }
    }

    /// Every content file below the root. `index` files map to the slug of
    /// their directory.
    pub fn scan(&self) -> Result<Vec<DocEntry>, ScanError> {
        let root = self.content.root();
        if !root.is_dir() {
            return Err(ScanError::MissingRoot(root.to_path_buf()));
        }
        tracing::info!(root = %root.display(), "scanning content");

        let mut entries = Vec::new();
        for file in get_all_content_files(self.content) {
            entries.push(self.scan_entry(root, file)?);
        }

        entries.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(entries)
    }

    fn scan_entry(&self, root: &Path, path: PathBuf) -> Result<DocEntry, ScanError> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| ScanError::InvalidPath(path.clone()))?;

        let mut parts: Vec<String> = relative
            .iter()
            .map(|part| part.to_string_lossy().to_string())
            .collect();

        let file_name = parts.pop().ok_or_else(|| ScanError::InvalidPath(path.clone()))?;
        if file_name != self.content.index_file_name() {
            parts.push(self.content.file_stem(&file_name).to_string());
        }

        let slug = parts
            .iter()
            .map(|part| strip_numeric_prefix(part).to_string())
            .collect();

        Ok(DocEntry {
            source_path: path,
            slug,
        })
    }
}

fn get_all_content_files(content: &ContentDir) -> Vec<PathBuf> {
    WalkDir::new(content.root())
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && content.is_content_file_name(&e.file_name().to_string_lossy()))
        .map(|e| e.path().to_path_buf())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn lists_pages_with_clean_slugs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("01-app/02-routing")).unwrap();
        fs::create_dir_all(root.join(".drafts")).unwrap();
        fs::write(root.join("index.mdx"), "").unwrap();
        fs::write(root.join("01-app/index.mdx"), "").unwrap();
        fs::write(root.join("01-app/02-routing/01_layouts.mdx"), "").unwrap();
        fs::write(root.join("01-app/notes.txt"), "").unwrap();
        fs::write(root.join(".drafts/secret.mdx"), "").unwrap();

        let content = ContentDir::new(root);
        let entries = SiteScanner::new(&content).scan().unwrap();
        let slugs: Vec<Vec<String>> = entries.into_iter().map(|e| e.slug).collect();

        assert_eq!(
            slugs,
            vec![
                vec![],
                vec!["app".to_string()],
                vec!["app".to_string(), "routing".to_string(), "layouts".to_string()],
            ]
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let content = ContentDir::new("/definitely/not/here");
        let err = SiteScanner::new(&content).scan().unwrap_err();
        assert!(matches!(err, ScanError::MissingRoot(_)));
    }
}
