//! Dashboard flows over the real router: sessions, login, report pages.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use bwebd::config::{AppConfig, CatalogConfig};
use bwebd::context::AppContext;
use bwebd::users::UserStore;
use bwebd::web;
use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tokio_rusqlite::{Connection, params};
use tower::ServiceExt;

fn dt(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .expect("timestamp in range")
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Catalog with one nightly backup that finished an hour ago.
async fn seed_catalog(dir: &TempDir) -> CatalogConfig {
    let path = dir.path().join("catalog.db");
    let conn = Connection::open(&path).await.expect("open catalog");
    let end = Utc::now().timestamp() - 3600;
    conn.call(move |c| {
        c.execute_batch(
            "CREATE TABLE Job (
                JobId INTEGER PRIMARY KEY,
                Name TEXT NOT NULL,
                Type TEXT NOT NULL,
                Level TEXT NOT NULL,
                JobStatus TEXT NOT NULL,
                JobFiles INTEGER NOT NULL DEFAULT 0,
                JobBytes INTEGER NOT NULL DEFAULT 0,
                ReadBytes INTEGER NOT NULL DEFAULT 0,
                StartTime TEXT NOT NULL,
                EndTime TEXT NOT NULL
            );
            CREATE TABLE Status (
                JobStatus TEXT PRIMARY KEY,
                JobStatusLong TEXT NOT NULL
            );
            CREATE TABLE Media (
                MediaId INTEGER PRIMARY KEY,
                VolumeName TEXT NOT NULL,
                VolBytes INTEGER NOT NULL DEFAULT 0
            );
            INSERT INTO Status (JobStatus, JobStatusLong)
                VALUES ('T', 'Completed successfully');
            INSERT INTO Media (VolumeName, VolBytes) VALUES ('Vol0001', 5242880);",
        )?;
        c.execute(
            "INSERT INTO Job (Name, Type, Level, JobStatus, JobFiles, JobBytes, \
             ReadBytes, StartTime, EndTime) VALUES \
             ('nightly', 'B', 'I', 'T', 42, 4096, 8192, ?1, ?2)",
            params![dt(end - 120), dt(end)],
        )?;
        Ok::<_, tokio_rusqlite::rusqlite::Error>(())
    })
    .await
    .expect("seed catalog");

    CatalogConfig {
        label: "test".to_string(),
        path,
    }
}

async fn app(dir: &TempDir, enable_users_auth: bool) -> Router {
    let catalog = seed_catalog(dir).await;
    let users_db = dir.path().join("users.db");
    let users = UserStore::open(&users_db).await.expect("users db");
    users.upsert("admin", "hunter2").await.expect("seed user");

    let config = AppConfig {
        enable_users_auth,
        users_db,
        catalogs: vec![catalog],
        ..AppConfig::default()
    };
    web::router(AppContext::new(config, users))
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

fn post_form(uri: &str, cookie: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("request")
}

fn session_cookie(response: &Response<Body>) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .expect("cookie text");
    raw.split(';').next().expect("cookie pair").to_string()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location")
        .to_str()
        .expect("location text")
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

/// Sign in and hand back the session cookie.
async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(get("/?page=login", None))
        .await
        .expect("login page");
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(post_form(
            "/?page=login",
            &cookie,
            "username=admin&password=hunter2",
        ))
        .await
        .expect("login post");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?page=home");
    cookie
}

#[tokio::test]
async fn fresh_visitor_is_redirected_to_login_with_a_session() {
    let dir = TempDir::new().expect("tempdir");
    let app = app(&dir, true).await;

    let response = app.oneshot(get("/", None)).await.expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?page=login");
    assert!(session_cookie(&response).starts_with("bwebd_session="));
}

#[tokio::test]
async fn guests_can_render_the_login_page() {
    let dir = TempDir::new().expect("tempdir");
    let app = app(&dir, true).await;

    let response = app
        .oneshot(get("/?page=login", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Sign in"));
    assert!(body.contains("name=\"password\""));
}

#[tokio::test]
async fn wrong_password_flashes_once_and_stays_on_login() {
    let dir = TempDir::new().expect("tempdir");
    let app = app(&dir, true).await;

    let response = app
        .clone()
        .oneshot(get("/?page=login", None))
        .await
        .expect("login page");
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(post_form(
            "/?page=login",
            &cookie,
            "username=admin&password=wrong",
        ))
        .await
        .expect("login post");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?page=login");

    let response = app
        .clone()
        .oneshot(get("/?page=login", Some(&cookie)))
        .await
        .expect("login page");
    let body = body_text(response).await;
    assert!(body.contains("Invalid username or password"));

    // The notice is one-shot.
    let response = app
        .clone()
        .oneshot(get("/?page=login", Some(&cookie)))
        .await
        .expect("login page");
    let body = body_text(response).await;
    assert!(!body.contains("Invalid username or password"));
}

#[tokio::test]
async fn successful_login_opens_the_dashboard() {
    let dir = TempDir::new().expect("tempdir");
    let app = app(&dir, true).await;
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(get("/", Some(&cookie)))
        .await
        .expect("home");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Volumes disk usage"));
    assert!(body.contains("5 MB"));
    assert!(body.contains("admin"));

    // Logged in visitors are bounced off the login page.
    let response = app
        .clone()
        .oneshot(get("/?page=login", Some(&cookie)))
        .await
        .expect("login page");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?page=home");
}

#[tokio::test]
async fn logout_closes_the_session() {
    let dir = TempDir::new().expect("tempdir");
    let app = app(&dir, true).await;
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(get("/?page=logout", Some(&cookie)))
        .await
        .expect("logout");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?page=login");

    // Back to guest rules.
    let response = app
        .clone()
        .oneshot(get("/", Some(&cookie)))
        .await
        .expect("home");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?page=login");

    let response = app
        .clone()
        .oneshot(get("/?page=login", Some(&cookie)))
        .await
        .expect("login page");
    let body = body_text(response).await;
    assert!(body.contains("You are signed out"));
}

#[tokio::test]
async fn report_page_renders_pending_then_full() {
    let dir = TempDir::new().expect("tempdir");
    let app = app(&dir, true).await;
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(get("/?page=backupjob", Some(&cookie)))
        .await
        .expect("report page");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Select a backup job"));
    assert!(body.contains("<option value=\"nightly\">nightly</option>"));

    let response = app
        .clone()
        .oneshot(post_form(
            "/?page=backupjob",
            &cookie,
            "backupjob_name=nightly&period=7",
        ))
        .await
        .expect("report post");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Stored bytes per day"));
    assert!(body.contains("Stored files per day"));
    assert!(body.contains("Completed successfully"));
    assert!(body.contains("Last week"));
}

#[tokio::test]
async fn unknown_job_is_a_server_error() {
    let dir = TempDir::new().expect("tempdir");
    let app = app(&dir, true).await;
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/?page=backupjob",
            &cookie,
            "backupjob_name=ghost&period=7",
        ))
        .await
        .expect("report post");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(body.contains("unknown backup job name"));
}

#[tokio::test]
async fn odd_period_is_a_server_error() {
    let dir = TempDir::new().expect("tempdir");
    let app = app(&dir, true).await;
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/?page=backupjob",
            &cookie,
            "backupjob_name=nightly&period=45",
        ))
        .await
        .expect("report post");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn disabled_auth_opens_the_dashboard_to_guests() {
    let dir = TempDir::new().expect("tempdir");
    let app = app(&dir, false).await;

    let response = app.clone().oneshot(get("/", None)).await.expect("home");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Volumes disk usage"));
    // No user box when accounts are off.
    assert!(!body.contains("Log out"));
}

#[tokio::test]
async fn unknown_page_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let app = app(&dir, true).await;
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(get("/?page=nonsense", Some(&cookie)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("Page not found"));
}
