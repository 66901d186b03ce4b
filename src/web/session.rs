//! In-memory session tracking for the dashboard.
//!
//! Sessions are identified by an opaque id carried in a cookie and live
//! for the lifetime of the process. Nothing here touches a database; a
//! restart simply logs everyone out.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Cookie that carries the session id.
pub const SESSION_COOKIE: &str = "bwebd_session";

/// Per-visitor state.
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    pub authenticated: bool,
    pub username: Option<String>,
    /// Sticky catalog choice, kept across page loads.
    pub catalog_id: Option<usize>,
    /// One-shot notices shown on the next rendered page.
    pub flash: Vec<FlashMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    /// Alert style, e.g. "success" or "danger".
    pub kind: String,
    pub message: String,
}

/// Thread-safe in-memory store for all live sessions.
///
/// Shared across the application via `AppContext`, same as the rest of
/// the process-wide state.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionData>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a fresh anonymous session and return its id.
    pub async fn create(&self) -> String {
        let id = Uuid::now_v7().to_string();
        let mut map = self.inner.write().await;
        map.insert(id.clone(), SessionData::default());
        id
    }

    pub async fn get(&self, id: &str) -> Option<SessionData> {
        let map = self.inner.read().await;
        map.get(id).cloned()
    }

    /// Write back a session after mutating it.
    pub async fn save(&self, id: &str, data: SessionData) {
        let mut map = self.inner.write().await;
        map.insert(id.to_string(), data);
    }

    pub async fn destroy(&self, id: &str) {
        let mut map = self.inner.write().await;
        map.remove(id);
    }

    /// Queue a one-shot notice on a session.
    pub async fn push_flash(&self, id: &str, kind: &str, message: &str) {
        let mut map = self.inner.write().await;
        if let Some(session) = map.get_mut(id) {
            session.flash.push(FlashMessage {
                kind: kind.to_string(),
                message: message.to_string(),
            });
        }
    }

    /// Drain the queued notices, clearing them from the session.
    pub async fn take_flash(&self, id: &str) -> Vec<FlashMessage> {
        let mut map = self.inner.write().await;
        match map.get_mut(id) {
            Some(session) => std::mem::take(&mut session.flash),
            None => Vec::new(),
        }
    }
}

/// Pull the session id out of the request's Cookie headers, if present.
pub fn session_id_from_cookies(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(axum::http::header::COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for pair in raw.split(';') {
            if let Some(id) = pair
                .trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
            {
                if !id.is_empty() {
                    return Some(id.to_string());
                }
            }
        }
    }
    None
}
