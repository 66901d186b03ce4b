use super::{Catalog, CatalogError};

impl Catalog {
    /// Total bytes written across all media volumes in this catalog.
    pub async fn disk_usage(&self) -> Result<u64, CatalogError> {
        let total = self
            .conn
            .call(|c| {
                let total = c.query_row("SELECT COALESCE(SUM(VolBytes), 0) FROM Media", [], |row| {
                    row.get::<_, i64>(0)
                })?;
                Ok(total)
            })
            .await?;
        Ok(total as u64)
    }
}
