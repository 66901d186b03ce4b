//! Web dashboard for bwebd.
//!
//! Serves the server-rendered reporting UI for browsing backup catalogs.
//! A single route handles every page; the `page` query parameter selects
//! which one, and a session middleware keeps guests on the login page.
//!
//! ## Architecture
//!
//! - `auth`: session middleware and the login gate
//! - `session`: in-memory session store behind the session cookie
//! - `pages`: per-page request handlers
//! - `render`: embedded templates and HTML assembly
//!
//! ## Endpoints
//!
//! - `GET /?page=...` - Render a dashboard page
//! - `POST /?page=...` - Login and report selection forms

pub mod auth;
pub mod pages;
pub mod render;
pub mod session;

use std::net::SocketAddr;
use std::sync::LazyLock;

use axum::{Router, middleware, routing::get};
use regex::Regex;
use tokio::sync::broadcast;

use crate::context::AppContext;

/// Build the dashboard router with the session gate in front of it.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(pages::index_get).post(pages::index_post))
        .layer(middleware::from_fn_with_state(ctx.clone(), auth::gate))
        .with_state(ctx)
}

/// Web server for the dashboard UI.
pub struct WebServer {
    bind_addr: SocketAddr,
    ctx: AppContext,
    shutdown_tx: broadcast::Sender<()>,
}

impl WebServer {
    /// Create a new web server bound to the given address.
    pub fn new(ctx: AppContext, bind_addr: SocketAddr) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            bind_addr,
            ctx,
            shutdown_tx,
        }
    }

    /// Start the web server. Runs until shutdown() is called.
    pub async fn start(&self) -> anyhow::Result<()> {
        let app = router(self.ctx.clone());

        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "Web dashboard listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Signal the server to shut down gracefully.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Page name from a raw query string, defaulting to the home page. The
/// gate needs this before any extractor has run.
pub(crate) fn page_from_query(query: Option<&str>) -> String {
    let Some(query) = query else {
        return "home".to_string();
    };
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == "page" && !value.is_empty() {
                return value.to_string();
            }
        }
    }
    "home".to_string()
}

pub(crate) fn page_url(target: &str) -> String {
    format!("/?page={target}")
}

static PARAM_ALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 ._:-]").unwrap());

/// Strip request parameters down to the characters job and page names are
/// made of. Keeps hostile input out of queries and rendered pages.
pub(crate) fn sanitize(raw: &str) -> String {
    PARAM_ALLOWED.replace_all(raw.trim(), "").to_string()
}
