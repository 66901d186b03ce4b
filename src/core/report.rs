//! Backup job report assembly.
//!
//! Pulls the job list, the per-day stored volume/file series and the raw
//! job rows for one named backup job out of the catalog, then derives the
//! display fields the dashboard shows. Everything here is pure given a
//! [`JobCatalog`] implementation, which keeps it testable without a real
//! catalog database.

use async_trait::async_trait;
use serde::Serialize;

use crate::catalog::CatalogError;
use crate::context::RequestContext;
use crate::core::format;
use crate::core::time::{self, ReportPeriod, TimeRange};

/// Catalog job type for backup jobs, as stored in Job.Type.
pub const BACKUP_JOB_TYPE: char = 'B';

/// Period used when the visitor has not picked one yet.
pub const DEFAULT_PERIOD_DAYS: u32 = 7;

/// Which per-day aggregate a time series carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesMetric {
    Bytes,
    Files,
}

/// Read access to the backup catalog, scoped to what the report needs.
#[async_trait]
pub trait JobCatalog {
    /// Sum of JobBytes or JobFiles for one job over `[range.start, range.end)`.
    async fn stored_metric(
        &self,
        job_name: &str,
        range: TimeRange,
        metric: SeriesMetric,
    ) -> Result<u64, CatalogError>;

    /// Distinct job names of the given type, sorted.
    async fn backup_job_names(&self, job_type: char) -> Result<Vec<String>, CatalogError>;

    /// Raw job rows for one job inside the window, most recent first.
    async fn job_records(
        &self,
        job_name: &str,
        job_type: char,
        range: TimeRange,
    ) -> Result<Vec<JobRow>, CatalogError>;
}

/// What the visitor asked the report page for.
#[derive(Debug, Clone)]
pub struct ReportSelection {
    pub job_name: Option<String>,
    pub period_days: u32,
    /// Unix timestamp the report window ends at.
    pub now: i64,
}

/// One chart point: day label plus the aggregated value for that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: u64,
}

/// One catalog row, as selected. Column order in the query and field
/// order here must stay in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub job_id: i64,
    pub level: String,
    pub job_files: u64,
    pub job_bytes: u64,
    pub read_bytes: u64,
    pub job_status: String,
    pub start_time: String,
    pub end_time: String,
    pub job_name: String,
    pub status_description: String,
}

/// A job row enriched with the derived, display-ready fields.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub job_id: i64,
    pub level: String,
    pub level_desc: String,
    pub job_files: u64,
    pub files_human: String,
    pub job_bytes: u64,
    pub bytes_human: String,
    pub job_status: String,
    pub status_description: String,
    pub start_time: String,
    pub end_time: String,
    pub elapsed: String,
    pub compression: String,
    pub speed: String,
}

impl JobRecord {
    pub fn from_row(row: JobRow, ctx: &RequestContext) -> Self {
        let elapsed_secs = time::elapsed_seconds(&row.start_time, &row.end_time);
        Self {
            job_id: row.job_id,
            level_desc: level_description(&row.level).to_string(),
            level: row.level,
            job_files: row.job_files,
            files_human: format::human_count(row.job_files),
            job_bytes: row.job_bytes,
            bytes_human: format::human_size(row.job_bytes as f64, 0),
            job_status: row.job_status,
            status_description: row.status_description,
            start_time: time::format_catalog_datetime(&row.start_time, &ctx.datetime_format),
            end_time: time::format_catalog_datetime(&row.end_time, &ctx.datetime_format),
            elapsed: format::elapsed_time(elapsed_secs),
            compression: format::compression_ratio(row.job_bytes, row.read_bytes),
            speed: format::speed(row.job_bytes, elapsed_secs),
        }
    }
}

/// Spell out the one-letter backup level codes. Unknown codes pass through
/// so an unusual catalog still renders something.
pub fn level_description(level: &str) -> &str {
    match level {
        "I" => "Incr",
        "D" => "Diff",
        "F" => "Full",
        other => other,
    }
}

/// Everything the backup job page renders.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// True until the visitor has picked a job, in which case only the
    /// job list is populated.
    pub selection_pending: bool,
    pub selected_job: Option<String>,
    pub period_days: u32,
    pub period_label: Option<String>,
    pub period_description: Option<String>,
    pub job_list: Vec<String>,
    pub stored_bytes_series: Vec<SeriesPoint>,
    pub stored_files_series: Vec<SeriesPoint>,
    pub job_records: Vec<JobRecord>,
    pub total_bytes_human: Option<String>,
    pub total_files_human: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("unknown backup job name: {0}")]
    UnknownJob(String),
    #[error("unsupported report period: {0} days")]
    InvalidPeriod(u32),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Build the full report for one selection. A selection without a job name
/// produces the pending report (job list only) without touching the job
/// tables; a job name that is not in the catalog's backup job list is
/// rejected before any per-day query runs.
pub async fn assemble<C>(
    catalog: &C,
    ctx: &RequestContext,
    selection: ReportSelection,
) -> Result<Report, ReportError>
where
    C: JobCatalog + Sync,
{
    let job_list = catalog.backup_job_names(BACKUP_JOB_TYPE).await?;

    let Some(job_name) = selection.job_name else {
        return Ok(Report {
            selection_pending: true,
            selected_job: None,
            period_days: DEFAULT_PERIOD_DAYS,
            period_label: None,
            period_description: None,
            job_list,
            stored_bytes_series: Vec::new(),
            stored_files_series: Vec::new(),
            job_records: Vec::new(),
            total_bytes_human: None,
            total_files_human: None,
        });
    };

    if !job_list.iter().any(|name| name == &job_name) {
        return Err(ReportError::UnknownJob(job_name));
    }

    let period = ReportPeriod::from_days(selection.period_days)
        .ok_or(ReportError::InvalidPeriod(selection.period_days))?;

    let overall = period.overall(selection.now);
    let period_description = format!(
        "From {} to {}",
        time::format_timestamp(overall.start, &ctx.datetime_format_short),
        time::format_timestamp(overall.end, &ctx.datetime_format_short),
    );

    let mut stored_bytes_series = Vec::with_capacity(period.days() as usize);
    let mut stored_files_series = Vec::with_capacity(period.days() as usize);
    for bucket in period.day_buckets(selection.now) {
        let label = time::month_day_label(bucket.start);
        let bytes = catalog
            .stored_metric(&job_name, bucket, SeriesMetric::Bytes)
            .await?;
        let files = catalog
            .stored_metric(&job_name, bucket, SeriesMetric::Files)
            .await?;
        stored_bytes_series.push(SeriesPoint {
            label: label.clone(),
            value: bytes,
        });
        stored_files_series.push(SeriesPoint {
            label,
            value: files,
        });
    }

    let total_bytes = catalog
        .stored_metric(&job_name, overall, SeriesMetric::Bytes)
        .await?;
    let total_files = catalog
        .stored_metric(&job_name, overall, SeriesMetric::Files)
        .await?;

    let job_records = catalog
        .job_records(&job_name, BACKUP_JOB_TYPE, overall)
        .await?
        .into_iter()
        .map(|row| JobRecord::from_row(row, ctx))
        .collect();

    Ok(Report {
        selection_pending: false,
        selected_job: Some(job_name),
        period_days: period.days(),
        period_label: Some(period.label().to_string()),
        period_description: Some(period_description),
        job_list,
        stored_bytes_series,
        stored_files_series,
        job_records,
        total_bytes_human: Some(format::human_size(total_bytes as f64, 0)),
        total_files_human: Some(format::human_count(total_files)),
    })
}
