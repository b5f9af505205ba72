pub mod builder;
pub mod components;
pub mod config;
pub mod content;
pub mod frontmatter;
pub mod markdown;
pub mod nav;
pub mod scanner;
pub mod site;
pub mod slug;
pub mod template;

// Re-export main types
pub use builder::{BuildError, BuildReport, SiteBuilder, StaticSite};
pub use config::{Config, ConfigError};
pub use content::{ContentDir, RelatedLink};
pub use frontmatter::Frontmatter;
pub use nav::NavNode;
pub use site::{Breadcrumb, DocPage, DocsSite, PageMetadata, SiteError, slug_from_path};
pub use template::{TemplateError, TemplateRenderer};
