//! Page handlers. Every response is a full HTML document.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use lapoz_core::{SiteError, slug_from_path};

use crate::AppState;
use crate::live_reload::inject_livereload_script;

fn html_response(state: &AppState, status: StatusCode, html: String) -> Response {
    let html = if state.live_reload_enabled() {
        inject_livereload_script(&html)
    } else {
        html
    };
    (status, Html(html)).into_response()
}

fn error_response(state: &AppState, path: &str, err: SiteError) -> Response {
    match err {
        SiteError::NotFound(_) => render_not_found(state, path),
        err => {
            tracing::error!(path = %path, error = %err, "failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to render {path}: {err}")).into_response()
        }
    }
}

fn render_not_found(state: &AppState, path: &str) -> Response {
    match state.site().render_not_found(path) {
        Ok(html) => html_response(state, StatusCode::NOT_FOUND, html),
        Err(err) => {
            tracing::error!(path = %path, error = %err, "failed to render not-found page");
            (StatusCode::NOT_FOUND, "404 - Not found").into_response()
        }
    }
}

pub(crate) async fn home(State(state): State<Arc<AppState>>) -> Response {
    match state.site().render_home() {
        Ok(html) => html_response(&state, StatusCode::OK, html),
        Err(err) => error_response(&state, "/", err),
    }
}

pub(crate) async fn docs_root(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    render_doc(&state, uri.path(), &[])
}

pub(crate) async fn doc_page(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Response {
    let cleaned = slug_from_path(&slug);
    render_doc(&state, uri.path(), &cleaned)
}

fn render_doc(state: &AppState, path: &str, cleaned: &[String]) -> Response {
    tracing::debug!(path = %path, "rendering page");
    match state.site().render_doc(cleaned) {
        Ok(html) => html_response(state, StatusCode::OK, html),
        Err(err) => error_response(state, path, err),
    }
}

pub(crate) async fn not_found(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    render_not_found(&state, uri.path())
}
