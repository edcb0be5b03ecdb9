use chrono::{DateTime, Duration, FixedOffset, Local, TimeZone, Utc};

/// Start and end of a lookback window of `period_days` ending now, rendered
/// as `YYYY-MM-DD` date strings for the aggregates range endpoint.
pub fn date_range(period_days: u32) -> (String, String) {
    let end = Utc::now();
    let start = end - Duration::days(i64::from(period_days));
    (
        start.format("%Y-%m-%d").to_string(),
        end.format("%Y-%m-%d").to_string(),
    )
}

/// The same lookback window as epoch seconds, for the quote download endpoint.
pub fn epoch_range(period_days: u32) -> (i64, i64) {
    let end = Utc::now();
    let start = end - Duration::days(i64::from(period_days));
    (start.timestamp(), end.timestamp())
}

/// Convert a bar timestamp in epoch milliseconds to a calendar datetime,
/// UTC by default or the machine's local zone when requested. Returns `None`
/// for timestamps outside chrono's representable range.
pub fn bar_datetime(epoch_ms: i64, local_timezone: bool) -> Option<DateTime<FixedOffset>> {
    let utc = Utc.timestamp_millis_opt(epoch_ms).single()?;
    if local_timezone {
        Some(utc.with_timezone(&Local).fixed_offset())
    } else {
        Some(utc.fixed_offset())
    }
}
