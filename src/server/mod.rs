// src/server/mod.rs

//! Development HTTP server.
//!
//! Serves the build directory, injects the live-reload client into HTML
//! pages and pushes refresh signals over a WebSocket.

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::context::DevContext;
use crate::watch::path_utils::is_descending;

pub mod client;
pub mod reload;

pub use client::{inject_client_script, CLIENT_JS, CLIENT_PATH, WS_PATH};
pub use reload::{ReloadEvent, ReloadHub};

/// Build the dev server router.
pub fn router(ctx: Arc<DevContext>) -> Router {
    Router::new()
        .route(CLIENT_PATH, get(client_js))
        .route(WS_PATH, get(ws_handler))
        .fallback(serve_build)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding dev server to {addr}"))
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, ctx: Arc<DevContext>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, build_dir = %ctx.build_dir().display(), "dev server listening");
    }
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await
        .context("dev server failed")?;
    info!("dev server stopped");
    Ok(())
}

async fn client_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_JS,
    )
}

async fn ws_handler(ws: WebSocketUpgrade, State(ctx): State<Arc<DevContext>>) -> impl IntoResponse {
    let rx = ctx.reload().subscribe();
    ws.on_upgrade(move |socket| push_reloads(socket, rx))
}

async fn push_reloads(mut socket: WebSocket, mut rx: broadcast::Receiver<ReloadEvent>) {
    debug!("reload client connected");
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "reload client lagged behind");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("reload client disconnected");
}

/// Fallback: files from the build directory. HTML pages get the client
/// script; everything else goes through `ServeDir`.
async fn serve_build(State(ctx): State<Arc<DevContext>>, req: Request) -> Response {
    let rel = PathBuf::from(req.uri().path().trim_start_matches('/'));
    if !is_descending(&rel) {
        return StatusCode::NOT_FOUND.into_response();
    }

    if let Some(page) = html_page(ctx.build_dir(), &rel) {
        return match tokio::fs::read_to_string(&page).await {
            Ok(text) => Html(inject_client_script(&text)).into_response(),
            Err(err) => {
                warn!(path = %page.display(), error = %err, "failed to read page");
                StatusCode::NOT_FOUND.into_response()
            }
        };
    }

    match ServeDir::new(ctx.build_dir()).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

/// HTML file that `rel` resolves to, directories mapping to `index.html`.
fn html_page(build_dir: &Path, rel: &Path) -> Option<PathBuf> {
    let mut path = build_dir.join(rel);
    if path.is_dir() {
        path = path.join("index.html");
    }
    let is_html = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
    (is_html && path.is_file()).then_some(path)
}
