//! Server-side page rendering.
//!
//! Templates are embedded at compile time and filled with plain string
//! replacement. Every dynamic value goes through [`escape_html`] before it
//! lands in a page.

use axum::response::Html;

use super::session::FlashMessage;
use crate::config::CatalogConfig;
use crate::context::RequestContext;
use crate::core::format;
use crate::core::report::{JobRecord, Report, SeriesPoint};
use crate::core::time::ReportPeriod;

const LAYOUT_HTML: &str = include_str!("assets/layout.html");
const HOME_HTML: &str = include_str!("assets/home.html");
const LOGIN_HTML: &str = include_str!("assets/login.html");
const BACKUPJOB_HTML: &str = include_str!("assets/backupjob.html");

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Wrap a page body in the shared layout.
fn chrome(
    ctx: &RequestContext,
    page: &str,
    title: &str,
    flash: &[FlashMessage],
    catalogs: &[CatalogConfig],
    body: String,
) -> Html<String> {
    let breadcrumb = if page == "home" {
        String::new()
    } else {
        format!(
            "<nav class=\"breadcrumb\"><a href=\"/?page=home\">Home</a> &rsaquo; {}</nav>",
            escape_html(title)
        )
    };

    // One notice at a time.
    let alert = flash
        .first()
        .map(|f| {
            format!(
                "<div class=\"alert {}\">{}</div>",
                escape_html(&f.kind),
                escape_html(&f.message)
            )
        })
        .unwrap_or_default();

    let user = if ctx.users_auth_enabled && ctx.authenticated {
        format!(
            "<span class=\"user\">{}</span><a href=\"/?page=logout\">Log out</a>",
            escape_html(ctx.username.as_deref().unwrap_or("user"))
        )
    } else {
        String::new()
    };

    let html = LAYOUT_HTML
        .replace("{{language}}", &escape_html(&ctx.language))
        .replace("{{app_name}}", env!("CARGO_PKG_NAME"))
        .replace("{{app_version}}", env!("CARGO_PKG_VERSION"))
        .replace("{{title}}", &escape_html(title))
        .replace("{{breadcrumb}}", &breadcrumb)
        .replace("{{alert}}", &alert)
        .replace("{{user}}", &user)
        .replace("{{catalogs}}", &catalog_selector(catalogs, ctx.catalog_id, page))
        .replace("{{body}}", &body);
    Html(html)
}

/// Links for switching between configured catalogs. Hidden when there is
/// only one.
fn catalog_selector(catalogs: &[CatalogConfig], current: usize, page: &str) -> String {
    if catalogs.len() < 2 {
        return String::new();
    }
    let mut out = String::new();
    for (id, catalog) in catalogs.iter().enumerate() {
        let class = if id == current { "catalog active" } else { "catalog" };
        out.push_str(&format!(
            "<a class=\"{class}\" href=\"/?page={page}&catalog_id={id}\">{}</a>",
            escape_html(&catalog.label)
        ));
    }
    out
}

pub fn home_page(
    ctx: &RequestContext,
    catalogs: &[CatalogConfig],
    flash: &[FlashMessage],
    disk_usage: u64,
) -> Html<String> {
    let body = HOME_HTML
        .replace("{{catalog_label}}", &escape_html(&ctx.catalog_label))
        .replace("{{disk_usage}}", &format::human_size(disk_usage as f64, 2));
    chrome(ctx, "home", "Dashboard", flash, catalogs, body)
}

pub fn login_page(
    ctx: &RequestContext,
    catalogs: &[CatalogConfig],
    flash: &[FlashMessage],
) -> Html<String> {
    chrome(ctx, "login", "Sign in", flash, catalogs, LOGIN_HTML.to_string())
}

pub fn backupjob_page(
    ctx: &RequestContext,
    catalogs: &[CatalogConfig],
    flash: &[FlashMessage],
    report: &Report,
) -> Html<String> {
    let mut job_options = String::from("<option value=\"\">Choose a job</option>");
    for name in &report.job_list {
        let selected = if report.selected_job.as_deref() == Some(name.as_str()) {
            " selected"
        } else {
            ""
        };
        let name = escape_html(name);
        job_options.push_str(&format!("<option value=\"{name}\"{selected}>{name}</option>"));
    }

    let mut period_options = String::new();
    for period in ReportPeriod::ALL {
        let selected = if period.days() == report.period_days {
            " selected"
        } else {
            ""
        };
        period_options.push_str(&format!(
            "<option value=\"{}\"{selected}>{}</option>",
            period.days(),
            period.label()
        ));
    }

    let report_html = if report.selection_pending {
        "<div class=\"alert info\">Select a backup job to build the report.</div>".to_string()
    } else {
        let mut out = String::from("<div class=\"cards\">");
        if let (Some(label), Some(desc)) = (&report.period_label, &report.period_description) {
            out.push_str(&format!(
                "<div class=\"card\"><h3>{}</h3><p>{}</p></div>",
                escape_html(label),
                escape_html(desc)
            ));
        }
        if let Some(total) = &report.total_bytes_human {
            out.push_str(&format!(
                "<div class=\"card\"><h3>Stored bytes</h3><p class=\"metric\">{}</p></div>",
                escape_html(total)
            ));
        }
        if let Some(total) = &report.total_files_human {
            out.push_str(&format!(
                "<div class=\"card\"><h3>Stored files</h3><p class=\"metric\">{}</p></div>",
                escape_html(total)
            ));
        }
        out.push_str("</div>");
        out.push_str(&chart_block(
            "stored-bytes",
            "Stored bytes per day",
            &report.stored_bytes_series,
        ));
        out.push_str(&chart_block(
            "stored-files",
            "Stored files per day",
            &report.stored_files_series,
        ));
        out.push_str(&records_table(&report.job_records));
        out
    };

    let body = BACKUPJOB_HTML
        .replace("{{job_options}}", &job_options)
        .replace("{{period_options}}", &period_options)
        .replace("{{report}}", &report_html);
    chrome(ctx, "backupjob", "Backup job report", flash, catalogs, body)
}

/// CSS bar chart plus the series as embedded JSON for tooling that wants
/// the raw numbers.
fn chart_block(id: &str, heading: &str, series: &[SeriesPoint]) -> String {
    let json = serde_json::to_string(series).unwrap_or_else(|_| "[]".to_string());
    let max = series.iter().map(|p| p.value).max().unwrap_or(0).max(1) as u128;

    let mut bars = String::new();
    for point in series {
        let mut pct = (point.value as u128 * 100 / max) as u64;
        if point.value > 0 && pct == 0 {
            pct = 1;
        }
        bars.push_str(&format!(
            "<div class=\"bar\" style=\"height: {pct}%\" title=\"{label}: {value}\"><span>{label}</span></div>",
            label = escape_html(&point.label),
            value = point.value,
        ));
    }

    format!(
        "<section class=\"chart\"><h3>{heading}</h3><div class=\"bars\">{bars}</div>\
         <script type=\"application/json\" id=\"{id}-data\">{json}</script></section>"
    )
}

fn records_table(records: &[JobRecord]) -> String {
    if records.is_empty() {
        return "<div class=\"alert info\">No job ran inside this period.</div>".to_string();
    }

    let mut rows = String::new();
    for r in records {
        rows.push_str(&format!(
            "<tr><td>{id}</td><td>{level}</td><td>{start}</td><td>{end}</td><td>{elapsed}</td>\
             <td>{files}</td><td>{bytes}</td><td>{compression}</td><td>{speed}</td>\
             <td class=\"status {class}\" title=\"{code}\">{status}</td></tr>",
            id = r.job_id,
            level = escape_html(&r.level_desc),
            start = escape_html(&r.start_time),
            end = escape_html(&r.end_time),
            elapsed = escape_html(&r.elapsed),
            files = escape_html(&r.files_human),
            bytes = escape_html(&r.bytes_human),
            compression = escape_html(&r.compression),
            speed = escape_html(&r.speed),
            class = status_css_class(&r.job_status),
            code = escape_html(&r.job_status),
            status = escape_html(&r.status_description),
        ));
    }

    format!(
        "<table class=\"records\"><thead><tr>\
         <th>Job id</th><th>Level</th><th>Start time</th><th>End time</th><th>Elapsed</th>\
         <th>Files</th><th>Bytes</th><th>Compression</th><th>Speed</th><th>Status</th>\
         </tr></thead><tbody>{rows}</tbody></table>"
    )
}

fn status_css_class(status: &str) -> &'static str {
    match status {
        "T" => "ok",
        "E" | "f" => "error",
        "R" => "info",
        "A" => "warning",
        _ => "",
    }
}

pub fn not_found_page(
    ctx: &RequestContext,
    catalogs: &[CatalogConfig],
    flash: &[FlashMessage],
    requested: &str,
) -> Html<String> {
    let body = format!(
        "<h2>Page not found</h2><p>There is no page named \"{}\".</p>",
        escape_html(requested)
    );
    chrome(ctx, "notfound", "Page not found", flash, catalogs, body)
}

/// Bare error page for requests that failed before a layout could be
/// built, e.g. a broken catalog selection.
pub fn error_page(message: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Error - {name}</title></head>\
         <body><h1>Something went wrong</h1><p>{msg}</p></body></html>",
        name = env!("CARGO_PKG_NAME"),
        msg = escape_html(message)
    ))
}
