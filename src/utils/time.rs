use chrono::{DateTime, Duration, Utc};

/// Get current UTC timestamp
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Convert timestamp to human readable format
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// `count` timestamps starting at `anchor` and stepping back by `step`.
pub fn descending_series(anchor: DateTime<Utc>, count: usize, step: Duration) -> Vec<DateTime<Utc>> {
    (0..count)
        .map(|i| anchor - step * i as i32)
        .collect()
}
