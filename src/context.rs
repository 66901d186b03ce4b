use std::sync::Arc;

use crate::config::{AppConfig, ConfigError};
use crate::users::UserStore;
use crate::web::session::{SessionData, SessionStore};

/// Process-wide state shared by every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    pub users: UserStore,
}

impl AppContext {
    pub fn new(config: AppConfig, users: UserStore) -> Self {
        Self {
            config: Arc::new(config),
            sessions: SessionStore::new(),
            users,
        }
    }
}

/// Everything page rendering needs about the current request, resolved
/// once per request from config and session instead of read ad hoc.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub authenticated: bool,
    pub username: Option<String>,
    pub users_auth_enabled: bool,
    pub catalog_id: usize,
    pub catalog_label: String,
    pub language: String,
    pub datetime_format: String,
    pub datetime_format_short: String,
}

impl RequestContext {
    /// Pick the catalog (explicit request parameter wins over the sticky
    /// session choice, both validated against the configured list) and
    /// snapshot the display settings.
    pub fn resolve(
        config: &AppConfig,
        session: &SessionData,
        requested_catalog: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let catalog_id = requested_catalog.or(session.catalog_id).unwrap_or(0);
        let catalog = config.catalog(catalog_id)?;

        Ok(Self {
            authenticated: session.authenticated || !config.enable_users_auth,
            username: session.username.clone(),
            users_auth_enabled: config.enable_users_auth,
            catalog_id,
            catalog_label: catalog.label.clone(),
            language: config.language.clone(),
            datetime_format: config.datetime_format.clone(),
            datetime_format_short: config.datetime_format_short.clone(),
        })
    }
}
