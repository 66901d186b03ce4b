const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Render a byte count with a 1024 divisor and a unit suffix. Trailing
/// zeros in the fractional part are trimmed, so `human_size(1024.0, 2)`
/// yields "1 KB" rather than "1.00 KB".
pub fn human_size(bytes: f64, precision: usize) -> String {
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let mut rendered = format!("{:.*}", precision, value);
    if rendered.contains('.') {
        rendered = rendered.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{} {}", rendered, UNITS[unit])
}

/// Thousands-separated integer, e.g. 1234567 -> "1,234,567".
pub fn human_count(count: u64) -> String {
    let digits = count.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

/// Fraction of the read data that compression saved, as "0.50"-style text.
/// Jobs that moved no data in either direction have no meaningful ratio.
pub fn compression_ratio(job_bytes: u64, read_bytes: u64) -> String {
    if job_bytes > 0 && read_bytes > 0 {
        format!("{:.2}", 1.0 - job_bytes as f64 / read_bytes as f64)
    } else {
        "N/A".to_string()
    }
}

/// Transfer rate over the job runtime, or "N/A" when the job finished
/// within the clock resolution.
pub fn speed(job_bytes: u64, elapsed_secs: Option<i64>) -> String {
    match elapsed_secs {
        Some(secs) if secs > 0 => {
            format!("{}/s", human_size(job_bytes as f64 / secs as f64, 2))
        }
        _ => "N/A".to_string(),
    }
}

/// "1h 23m 04s"-style runtime, or "N/A" when the bounds were unusable.
pub fn elapsed_time(elapsed_secs: Option<i64>) -> String {
    match elapsed_secs {
        Some(secs) => {
            let hours = secs / 3600;
            let minutes = (secs % 3600) / 60;
            let seconds = secs % 60;
            format!("{}h {:02}m {:02}s", hours, minutes, seconds)
        }
        None => "N/A".to_string(),
    }
}
