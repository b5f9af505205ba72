use anyhow::Result;
use axum::{Router, handler::Handler, routing::get};
use lapoz_core::{Config, DocsSite};
use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, RwLock},
};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

mod handlers;
mod live_reload;

pub use live_reload::{LIVERELOAD_PATH, inject_livereload_script};

/// Configuration for the documentation server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Content directory holding the documentation tree
    pub content_dir: PathBuf,
    /// Theme directory overriding the built-in templates
    pub theme_dir: Option<PathBuf>,
    /// Static assets served as-is
    pub public_dir: PathBuf,
    /// Site configuration
    pub site: Config,
    /// Watch for changes and reload connected browsers
    pub live_reload: bool,
    /// Auto-open browser
    pub open: bool,
    /// Patterns to ignore when watching
    pub ignore: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            content_dir: PathBuf::from("./docs"),
            theme_dir: None,
            public_dir: PathBuf::from("./public"),
            site: Config::default(),
            live_reload: true,
            open: false,
            ignore: vec![".git".to_string(), "*.tmp".to_string()],
        }
    }
}

/// State shared by all handlers.
pub(crate) struct AppState {
    site: RwLock<Arc<DocsSite>>,
    config: ServerConfig,
    reload_tx: Option<broadcast::Sender<String>>,
}

impl AppState {
    pub(crate) fn new(config: ServerConfig) -> Result<Self> {
        let site = DocsSite::new(&config.content_dir, config.site.clone(), config.theme_dir.as_deref())?;
        let reload_tx = config.live_reload.then(|| broadcast::channel::<String>(100).0);

        Ok(Self {
            site: RwLock::new(Arc::new(site)),
            config,
            reload_tx,
        })
    }

    pub(crate) fn site(&self) -> Arc<DocsSite> {
        self.site
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Rebuild the site so template changes are picked up.
    pub(crate) fn reload_site(&self) -> Result<()> {
        let config = &self.config;
        let site = DocsSite::new(&config.content_dir, config.site.clone(), config.theme_dir.as_deref())?;
        *self.site.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(site);
        Ok(())
    }

    pub(crate) fn live_reload_enabled(&self) -> bool {
        self.reload_tx.is_some()
    }
}

/// Build the application router.
pub(crate) fn router(state: Arc<AppState>) -> Router {
    let docs_route = state.site().config().docs.route();

    let public = ServeDir::new(&state.config.public_dir)
        .not_found_service(handlers::not_found.with_state(state.clone()));

    let mut router = Router::new()
        .route("/", get(handlers::home))
        .route(&docs_route, get(handlers::docs_root))
        .route(&format!("{docs_route}/"), get(handlers::docs_root))
        .route(&format!("{docs_route}/{{*slug}}"), get(handlers::doc_page));

    if state.live_reload_enabled() {
        router = router.route(LIVERELOAD_PATH, get(live_reload::websocket_handler));
    }

    router.fallback_service(public).with_state(state)
}

/// A documentation server rendering pages on request
pub struct DocsServer {
    config: ServerConfig,
}

impl DocsServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Run the server until it is stopped
    pub async fn run(self) -> Result<()> {
        if !self.config.content_dir.is_dir() {
            return Err(anyhow::anyhow!(
                "Content directory does not exist: {}",
                self.config.content_dir.display()
            ));
        }
        if self.config.site.docs.route().is_empty() {
            return Err(anyhow::anyhow!("The docs route cannot be the site root"));
        }

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let open = self.config.open;
        let state = Arc::new(AppState::new(self.config)?);

        if state.live_reload_enabled() {
            let watcher_state = state.clone();
            tokio::spawn(async move {
                if let Err(e) = live_reload::watch(watcher_state).await {
                    tracing::error!(error = %e, "file watcher stopped");
                }
            });
            tracing::info!("Live reload enabled at ws://{}{}", addr, LIVERELOAD_PATH);
        }

        let app = router(state.clone());

        tracing::info!("Serving at http://{}", addr);
        tracing::info!("Content: {}", state.config.content_dir.display());

        // Open browser if requested
        if open && let Err(e) = open::that(format!("http://{}", addr)) {
            tracing::warn!(error = %e, "failed to open browser");
        }

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Fixture {
        _content: TempDir,
        _public: TempDir,
        config: ServerConfig,
    }

    fn fixture(live_reload: bool) -> Fixture {
        let content = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        fs::create_dir_all(content.path().join("01-app")).unwrap();
        fs::write(content.path().join("index.mdx"), "---\ntitle: Intro\n---\nWelcome").unwrap();
        fs::write(
            content.path().join("01-app/02-routing.mdx"),
            "---\ntitle: Routing\n---\n<AppOnly>\nOnly for the app router\n</AppOnly>\n",
        )
        .unwrap();
        fs::write(public.path().join("logo.svg"), "<svg/>").unwrap();

        let config = ServerConfig {
            content_dir: content.path().to_path_buf(),
            public_dir: public.path().to_path_buf(),
            live_reload,
            ..ServerConfig::default()
        };

        Fixture {
            _content: content,
            _public: public,
            config,
        }
    }

    async fn get(config: &ServerConfig, uri: &str) -> (StatusCode, String) {
        let state = Arc::new(AppState::new(config.clone()).unwrap());
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    #[tokio::test]
    async fn serves_home_and_doc_pages() {
        let fixture = fixture(false);

        let (status, body) = get(&fixture.config, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("class=\"home\""));

        let (status, body) = get(&fixture.config, "/docs").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome"));

        let (status, body) = get(&fixture.config, "/docs/app/routing").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Only for the app router"));
        assert!(body.contains("<title>Routing | Documentation</title>"));
    }

    #[tokio::test]
    async fn unknown_pages_get_the_not_found_page() {
        let fixture = fixture(false);

        let (status, body) = get(&fixture.config, "/docs/app/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page not found"));

        let (status, _) = get(&fixture.config, "/nothing-here.png").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn trailing_slash_serves_the_docs_index() {
        let fixture = fixture(false);
        let (status, body) = get(&fixture.config, "/docs/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome"));
    }

    #[tokio::test]
    async fn docs_route_without_leading_slash_still_serves() {
        let mut fixture = fixture(false);
        fixture.config.site.docs.route = "docs".to_string();

        let (status, body) = get(&fixture.config, "/docs/app/routing").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Only for the app router"));
        assert!(body.contains("href=\"/docs/app/routing\""));
    }

    #[tokio::test]
    async fn hidden_pages_are_not_served() {
        let fixture = fixture(false);
        fs::create_dir_all(fixture.config.content_dir.join(".drafts")).unwrap();
        fs::write(fixture.config.content_dir.join(".drafts/secret.mdx"), "secret").unwrap();

        let (status, body) = get(&fixture.config, "/docs/.drafts/secret").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("secret</p>"));
    }

    #[tokio::test]
    async fn serves_public_assets() {
        let fixture = fixture(false);
        let (status, body) = get(&fixture.config, "/logo.svg").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<svg/>");
    }

    #[tokio::test]
    async fn injects_reload_script_only_when_enabled() {
        let with = fixture(true);
        let (_, body) = get(&with.config, "/docs").await;
        assert!(body.contains(LIVERELOAD_PATH));

        let without = fixture(false);
        let (_, body) = get(&without.config, "/docs").await;
        assert!(!body.contains(LIVERELOAD_PATH));
    }
}
