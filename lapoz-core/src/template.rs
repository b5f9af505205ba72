use std::path::{Path, PathBuf};

use tera::{Context, Tera};
use thiserror::Error;
use walkdir::WalkDir;

/// Templates compiled into the binary. A theme directory may override any of
/// them by file name.
const EMBEDDED_TEMPLATES: [(&str, &str); 4] = [
    ("base.html", include_str!("../theme/base.html")),
    ("home.html", include_str!("../theme/home.html")),
    ("doc.html", include_str!("../theme/doc.html")),
    ("not_found.html", include_str!("../theme/not_found.html")),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    TeraError(#[from] tera::Error),
}

pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Load the embedded templates, overridden by `theme_dir` when it exists.
    pub fn new(theme_dir: Option<&Path>) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.set_escape_fn(escape_html);
        tera.add_raw_templates(EMBEDDED_TEMPLATES)?;

        if let Some(dir) = theme_dir.filter(|d| d.is_dir()) {
            let files: Vec<(PathBuf, Option<String>)> = WalkDir::new(dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file() && e.path().extension().is_some_and(|ext| ext == "html"))
                .filter_map(|e| {
                    let name = e.path().strip_prefix(dir).ok()?.to_string_lossy().replace('\\', "/");
                    Some((e.path().to_path_buf(), Some(name)))
                })
                .collect();

            tracing::info!(theme = %dir.display(), templates = files.len(), "loading theme templates");
            tera.add_template_files(files)?;
        }

        Ok(Self { tera })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    /// Render a template with the given context
    pub fn render(&self, template: &str, context: &Context) -> Result<String, TemplateError> {
        Ok(self.tera.render(template, context)?)
    }
}

/// Autoescape that leaves `/` alone so routes stay readable in the output.
fn escape_html(input: &str) -> String {
    html_escape::encode_quoted_attribute(input).into_owned()
}
