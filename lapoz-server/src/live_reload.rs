use anyhow::Result;
use axum::{
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
};
use notify::Watcher;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::broadcast;

use crate::AppState;

pub const LIVERELOAD_PATH: &str = "/__livereload";

pub(crate) async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let reload_tx = state.reload_tx.clone();
    ws.on_upgrade(move |socket| async move {
        if let Some(reload_tx) = reload_tx {
            websocket_connection(socket, reload_tx).await;
        }
    })
}

async fn websocket_connection(mut socket: WebSocket, reload_tx: broadcast::Sender<String>) {
    let mut rx = reload_tx.subscribe();

    // Send initial connection confirmation
    if socket
        .send(Message::Text("connected".into()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(reload_msg) => {
                        if socket.send(Message::Text(reload_msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            msg = socket.recv() => {
                if msg.is_none() {
                    break;
                }
            }
        }
    }
}

fn is_ignored(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();
    patterns.iter().any(|pattern| match pattern.strip_prefix('*') {
        Some(suffix) => path_str.ends_with(suffix),
        None => path_str.contains(pattern.as_str()),
    })
}

/// Watch content, theme and public directories; reload browsers on change.
pub(crate) async fn watch(state: Arc<AppState>) -> Result<()> {
    let Some(reload_tx) = state.reload_tx.clone() else {
        return Ok(());
    };

    let (tx, mut rx) = tokio::sync::mpsc::channel::<PathBuf>(100);
    let ignore_patterns = state.config.ignore.clone();

    let mut debouncer = new_debouncer(Duration::from_millis(300), move |res: DebounceEventResult| {
        if let Ok(events) = res {
            for event in events {
                if !is_ignored(&event.path, &ignore_patterns) {
                    let _ = tx.blocking_send(event.path);
                }
            }
        }
    })?;

    let theme_dir = state.config.theme_dir.clone();
    let mut watched = vec![state.config.content_dir.clone(), state.config.public_dir.clone()];
    watched.extend(theme_dir.clone());

    for dir in watched.iter().filter(|d| d.exists()) {
        debouncer
            .watcher()
            .watch(dir, notify::RecursiveMode::Recursive)?;
        tracing::info!("Watching: {}", dir.display());
    }

    let abs_theme_dir = theme_dir.map(|d| d.canonicalize().unwrap_or(d));

    // Process file change events with simple deduplication
    let mut last_reload: Option<Instant> = None;
    while let Some(path) = rx.recv().await {
        tracing::debug!("File changed: {}", path.display());

        let abs_path = path.canonicalize().unwrap_or(path.clone());
        if abs_theme_dir.as_ref().is_some_and(|theme| abs_path.starts_with(theme)) {
            if let Err(e) = state.reload_site() {
                tracing::warn!(error = %e, "failed to reload templates");
                continue;
            }
            tracing::info!("Templates reloaded");
        }

        let now = Instant::now();
        if last_reload.is_none_or(|last| now.duration_since(last) > Duration::from_millis(500)) {
            // No receivers just means no browser is connected
            let _ = reload_tx.send("reload".to_string());
            last_reload = Some(now);
            tracing::info!("Sent reload signal");
        }
    }

    Ok(())
}

/// Inject live reload script into HTML content
pub fn inject_livereload_script(html: &str) -> String {
    let script = format!(
        r#"
<script>
(function() {{
    const scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
    const socket = new WebSocket(scheme + location.host + '{}');
    socket.onmessage = function(event) {{
        if (event.data === 'reload') {{
            location.reload();
        }}
    }};
    socket.onclose = function() {{
        console.log('Live reload disconnected');
    }};
}})();
</script>
"#,
        LIVERELOAD_PATH
    );

    // Try to inject before closing body tag, or at the end if not found
    if let Some(pos) = html.rfind("</body>") {
        let mut result = String::with_capacity(html.len() + script.len());
        result.push_str(&html[..pos]);
        result.push_str(&script);
        result.push_str(&html[pos..]);
        result
    } else {
        format!("{}{}", html, script)
    }
}
