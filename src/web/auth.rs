//! Session middleware and the login gate.
//!
//! Every request passes through [`gate`]: it attaches a session (creating
//! one and setting the cookie when the visitor has none), then either lets
//! the request through or redirects based on the login state and the page
//! being asked for.

use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use super::session::{self, SESSION_COOKIE};
use crate::context::AppContext;

/// What the gate decided for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    Allow,
    RedirectTo(&'static str),
}

/// The gate rules, separated from the middleware plumbing. Applied in
/// order: guests only ever see the login page, and a logged-in visitor
/// asking for the login page is bounced home.
pub fn decide(authenticated: bool, page: &str) -> GateAction {
    if !authenticated && page != "login" {
        return GateAction::RedirectTo("login");
    }
    if authenticated && page == "login" {
        return GateAction::RedirectTo("home");
    }
    GateAction::Allow
}

/// Session id for the current request, inserted by [`gate`] for handlers
/// to pick up as an `Extension`.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

pub async fn gate(State(ctx): State<AppContext>, mut request: Request, next: Next) -> Response {
    // Reuse the visitor's session when the cookie points at a live one,
    // otherwise start fresh. A stale cookie from a previous process gets
    // replaced rather than trusted.
    let existing = match session::session_id_from_cookies(request.headers()) {
        Some(id) => ctx.sessions.get(&id).await.map(|_| id),
        None => None,
    };
    let (session_id, fresh_cookie) = match existing {
        Some(id) => (id, false),
        None => (ctx.sessions.create().await, true),
    };

    let session = ctx.sessions.get(&session_id).await.unwrap_or_default();
    let authenticated = session.authenticated || !ctx.config.enable_users_auth;
    let page = super::page_from_query(request.uri().query());

    request.extensions_mut().insert(SessionId(session_id.clone()));

    let mut response = match decide(authenticated, &page) {
        GateAction::Allow => next.run(request).await,
        GateAction::RedirectTo(target) => {
            tracing::debug!(page = %page, target = %target, "Gate redirect");
            Redirect::to(&super::page_url(target)).into_response()
        }
    };

    if fresh_cookie {
        let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
