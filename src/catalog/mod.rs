pub mod jobs;
pub mod volumes;

use std::path::PathBuf;

use tokio_rusqlite::Connection;

use crate::config::CatalogConfig;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog database not found at {0}")]
    Unavailable(PathBuf),
    #[error("catalog query failed: {0}")]
    Query(#[from] tokio_rusqlite::Error),
}

/// Handle on one configured catalog database. All reads go through the
/// async connection so catalog latency never blocks the server.
pub struct Catalog {
    conn: Connection,
    label: String,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl Catalog {
    pub async fn connect(config: &CatalogConfig) -> Result<Self, CatalogError> {
        if !config.path.exists() {
            return Err(CatalogError::Unavailable(config.path.clone()));
        }
        let conn = Connection::open(&config.path)
            .await
            .map_err(tokio_rusqlite::Error::from)?;
        Ok(Self {
            conn,
            label: config.label.clone(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Version string of the catalog database engine.
    pub async fn server_version(&self) -> Result<String, CatalogError> {
        let version = self
            .conn
            .call(|c| {
                let version = c.query_row("SELECT sqlite_version()", [], |row| {
                    row.get::<_, String>(0)
                })?;
                Ok(version)
            })
            .await?;
        Ok(version)
    }
}
