//! Request handlers for the dashboard pages.
//!
//! A single route serves everything; the `page` query parameter picks the
//! page, which mirrors how the dashboard is linked together. Handlers stay
//! thin: resolve the request context, call into the catalog and report
//! code, hand the result to the renderer.

use axum::Form;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;
use serde::Deserialize;

use super::auth::SessionId;
use super::session::SessionData;
use super::{page_url, render, sanitize};
use crate::catalog::Catalog;
use crate::context::{AppContext, RequestContext};
use crate::core::report::{self, DEFAULT_PERIOD_DAYS, ReportSelection};

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub catalog_id: Option<usize>,
    pub backupjob_name: Option<String>,
    pub period: Option<u32>,
}

/// Union of the fields the login and report forms post. Each handler picks
/// the ones it cares about.
#[derive(Debug, Default, Deserialize)]
pub struct FormFields {
    pub username: Option<String>,
    pub password: Option<String>,
    pub backupjob_name: Option<String>,
    pub period: Option<u32>,
}

pub async fn index_get(
    State(ctx): State<AppContext>,
    Extension(session_id): Extension<SessionId>,
    Query(params): Query<PageParams>,
) -> Response {
    dispatch(ctx, session_id, params, None).await
}

pub async fn index_post(
    State(ctx): State<AppContext>,
    Extension(session_id): Extension<SessionId>,
    Query(params): Query<PageParams>,
    Form(fields): Form<FormFields>,
) -> Response {
    dispatch(ctx, session_id, params, Some(fields)).await
}

async fn dispatch(
    ctx: AppContext,
    SessionId(session_id): SessionId,
    params: PageParams,
    form: Option<FormFields>,
) -> Response {
    let page = match params.page.as_deref() {
        Some(p) if !p.trim().is_empty() => sanitize(p),
        _ => "home".to_string(),
    };

    let mut session = ctx.sessions.get(&session_id).await.unwrap_or_default();

    let request_ctx = match RequestContext::resolve(&ctx.config, &session, params.catalog_id) {
        Ok(rc) => rc,
        Err(e) => return internal_error(&e.to_string()),
    };

    // The catalog choice sticks until the visitor picks another one.
    if session.catalog_id != Some(request_ctx.catalog_id) {
        session.catalog_id = Some(request_ctx.catalog_id);
        ctx.sessions.save(&session_id, session.clone()).await;
    }

    match page.as_str() {
        "home" => home(ctx, session_id, request_ctx).await,
        "login" => match form {
            Some(fields) => login_submit(ctx, session_id, fields).await,
            None => login_form(ctx, session_id, request_ctx).await,
        },
        "logout" => logout(ctx, session_id, session).await,
        "backupjob" => backupjob(ctx, session_id, request_ctx, params, form).await,
        other => not_found(ctx, session_id, request_ctx, other).await,
    }
}

async fn home(ctx: AppContext, session_id: String, request_ctx: RequestContext) -> Response {
    let catalog_config = match ctx.config.catalog(request_ctx.catalog_id) {
        Ok(c) => c.clone(),
        Err(e) => return internal_error(&e.to_string()),
    };
    let disk_usage = match Catalog::connect(&catalog_config).await {
        Ok(catalog) => match catalog.disk_usage().await {
            Ok(bytes) => bytes,
            Err(e) => return internal_error(&e.to_string()),
        },
        Err(e) => return internal_error(&e.to_string()),
    };

    let flash = ctx.sessions.take_flash(&session_id).await;
    render::home_page(&request_ctx, &ctx.config.catalogs, &flash, disk_usage).into_response()
}

async fn login_form(ctx: AppContext, session_id: String, request_ctx: RequestContext) -> Response {
    let flash = ctx.sessions.take_flash(&session_id).await;
    render::login_page(&request_ctx, &ctx.config.catalogs, &flash).into_response()
}

async fn login_submit(ctx: AppContext, session_id: String, fields: FormFields) -> Response {
    // The username is sanitized like any other parameter; the password is
    // passed through untouched so no valid password gets mangled.
    let username = sanitize(fields.username.as_deref().unwrap_or(""));
    let password = fields.password.unwrap_or_default();

    if username.is_empty() || password.is_empty() {
        ctx.sessions
            .push_flash(&session_id, "danger", "Invalid username or password")
            .await;
        return Redirect::to(&page_url("login")).into_response();
    }

    match ctx.users.verify(&username, &password).await {
        Ok(true) => {
            let mut session = ctx.sessions.get(&session_id).await.unwrap_or_default();
            session.authenticated = true;
            session.username = Some(username.clone());
            ctx.sessions.save(&session_id, session).await;
            tracing::info!(user = %username, "Login succeeded");
            Redirect::to(&page_url("home")).into_response()
        }
        Ok(false) => {
            tracing::warn!(user = %username, "Login rejected");
            ctx.sessions
                .push_flash(&session_id, "danger", "Invalid username or password")
                .await;
            Redirect::to(&page_url("login")).into_response()
        }
        Err(e) => internal_error(&e.to_string()),
    }
}

async fn logout(ctx: AppContext, session_id: String, mut session: SessionData) -> Response {
    session.authenticated = false;
    session.username = None;
    ctx.sessions.save(&session_id, session).await;
    ctx.sessions
        .push_flash(&session_id, "success", "You are signed out. See you soon.")
        .await;
    Redirect::to(&page_url("login")).into_response()
}

async fn backupjob(
    ctx: AppContext,
    session_id: String,
    request_ctx: RequestContext,
    params: PageParams,
    form: Option<FormFields>,
) -> Response {
    let form = form.unwrap_or_default();
    let job_name = form
        .backupjob_name
        .or(params.backupjob_name)
        .map(|raw| sanitize(&raw))
        .filter(|name| !name.is_empty());
    let period_days = form.period.or(params.period).unwrap_or(DEFAULT_PERIOD_DAYS);

    let catalog_config = match ctx.config.catalog(request_ctx.catalog_id) {
        Ok(c) => c.clone(),
        Err(e) => return internal_error(&e.to_string()),
    };
    let catalog = match Catalog::connect(&catalog_config).await {
        Ok(c) => c,
        Err(e) => return internal_error(&e.to_string()),
    };

    let selection = ReportSelection {
        job_name,
        period_days,
        now: Utc::now().timestamp(),
    };
    let report = match report::assemble(&catalog, &request_ctx, selection).await {
        Ok(r) => r,
        Err(e) => return internal_error(&e.to_string()),
    };

    let flash = ctx.sessions.take_flash(&session_id).await;
    render::backupjob_page(&request_ctx, &ctx.config.catalogs, &flash, &report).into_response()
}

async fn not_found(
    ctx: AppContext,
    session_id: String,
    request_ctx: RequestContext,
    page: &str,
) -> Response {
    let flash = ctx.sessions.take_flash(&session_id).await;
    (
        StatusCode::NOT_FOUND,
        render::not_found_page(&request_ctx, &ctx.config.catalogs, &flash, page),
    )
        .into_response()
}

fn internal_error(message: &str) -> Response {
    tracing::error!(error = %message, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        render::error_page(message),
    )
        .into_response()
}
