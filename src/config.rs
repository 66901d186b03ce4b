use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/bwebd/config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
    #[error("configuration error: {0}")]
    Invalid(String),
    #[error("catalog id {0} does not match any configured catalog")]
    UnknownCatalog(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the dashboard listens on.
    pub listen: SocketAddr,
    pub language: String,
    /// Display format for catalog datetimes.
    pub datetime_format: String,
    /// Shorter variant used in period descriptions.
    pub datetime_format_short: String,
    /// When false, the dashboard is open and the login page is skipped.
    pub enable_users_auth: bool,
    /// SQLite database holding dashboard user accounts.
    pub users_db: PathBuf,
    #[serde(default, rename = "catalog")]
    pub catalogs: Vec<CatalogConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Name shown in the catalog selector.
    pub label: String,
    pub path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8481)),
            language: "en_US".to_string(),
            datetime_format: "%Y-%m-%d %H:%M:%S".to_string(),
            datetime_format_short: "%Y-%m-%d".to_string(),
            enable_users_auth: true,
            users_db: PathBuf::from("bwebd-users.db"),
            catalogs: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Layered load: defaults, then the TOML file, then BWEBD_* environment
    /// variables, then CLI arguments on top.
    pub fn new<A: Serialize>(path: Option<&Path>, args: Option<&A>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("BWEBD_"));
        if let Some(args) = args {
            figment = figment.merge(Serialized::defaults(args));
        }
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.language.is_empty() {
            return Err(ConfigError::Invalid("language must not be empty".into()));
        }
        if self.datetime_format.is_empty() || self.datetime_format_short.is_empty() {
            return Err(ConfigError::Invalid(
                "datetime formats must not be empty".into(),
            ));
        }
        if self.catalogs.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[catalog]] entry is required".into(),
            ));
        }
        Ok(())
    }

    pub fn catalog(&self, id: usize) -> Result<&CatalogConfig, ConfigError> {
        self.catalogs.get(id).ok_or(ConfigError::UnknownCatalog(id))
    }
}
