//! Job table queries backing the backup job report.
//!
//! Catalog EndTime columns hold `YYYY-MM-DD HH:MM:SS` text, so unix window
//! bounds are converted in SQL with `datetime(?, 'unixepoch')` rather than
//! parsed back out in Rust.

use async_trait::async_trait;
use tokio_rusqlite::{params, rusqlite};

use super::{Catalog, CatalogError};
use crate::core::report::{JobCatalog, JobRow, SeriesMetric};
use crate::core::time::TimeRange;

#[async_trait]
impl JobCatalog for Catalog {
    async fn stored_metric(
        &self,
        job_name: &str,
        range: TimeRange,
        metric: SeriesMetric,
    ) -> Result<u64, CatalogError> {
        let column = match metric {
            SeriesMetric::Bytes => "JobBytes",
            SeriesMetric::Files => "JobFiles",
        };
        let sql = format!(
            "SELECT COALESCE(SUM({column}), 0) FROM Job \
             WHERE Name = ?1 AND Type = 'B' \
             AND EndTime >= datetime(?2, 'unixepoch') \
             AND EndTime < datetime(?3, 'unixepoch')"
        );

        let job_name = job_name.to_string();
        let total = self
            .conn
            .call(move |c| {
                let total = c.query_row(&sql, params![job_name, range.start, range.end], |row| {
                    row.get::<_, i64>(0)
                })?;
                Ok(total)
            })
            .await?;
        Ok(total as u64)
    }

    async fn backup_job_names(&self, job_type: char) -> Result<Vec<String>, CatalogError> {
        let job_type = job_type.to_string();
        let names = self
            .conn
            .call(move |c| {
                let mut stmt =
                    c.prepare("SELECT DISTINCT Name FROM Job WHERE Type = ?1 ORDER BY Name")?;
                let names = stmt
                    .query_map(params![job_type], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<String>, rusqlite::Error>>()?;
                Ok(names)
            })
            .await?;
        Ok(names)
    }

    async fn job_records(
        &self,
        job_name: &str,
        job_type: char,
        range: TimeRange,
    ) -> Result<Vec<JobRow>, CatalogError> {
        let job_name = job_name.to_string();
        let job_type = job_type.to_string();
        let rows = self
            .conn
            .call(move |c| {
                let mut stmt = c.prepare(
                    "SELECT Job.JobId, Job.Level, Job.JobFiles, Job.JobBytes, Job.ReadBytes, \
                            Job.JobStatus, Job.StartTime, Job.EndTime, Job.Name, \
                            Status.JobStatusLong \
                     FROM Job \
                     JOIN Status ON Job.JobStatus = Status.JobStatus \
                     WHERE Job.Name = ?1 AND Job.Type = ?2 \
                     AND Job.EndTime BETWEEN datetime(?3, 'unixepoch') \
                                         AND datetime(?4, 'unixepoch') \
                     ORDER BY Job.EndTime DESC",
                )?;
                let rows = stmt
                    .query_map(
                        params![job_name, job_type, range.start, range.end],
                        |row| {
                            Ok(JobRow {
                                job_id: row.get(0)?,
                                level: row.get(1)?,
                                job_files: row.get(2)?,
                                job_bytes: row.get(3)?,
                                read_bytes: row.get(4)?,
                                job_status: row.get(5)?,
                                start_time: row.get(6)?,
                                end_time: row.get(7)?,
                                job_name: row.get(8)?,
                                status_description: row.get(9)?,
                            })
                        },
                    )?
                    .collect::<Result<Vec<JobRow>, rusqlite::Error>>()?;
                Ok(rows)
            })
            .await?;
        Ok(rows)
    }
}
