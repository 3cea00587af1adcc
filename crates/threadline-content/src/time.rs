use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampStyle {
    /// `Mar 4`
    #[default]
    Short,
    /// `Mar 4, 2025`
    Long,
}

/// Human-relative label for `timestamp` as seen at `now`.
///
/// Under a minute is `now`, under an hour `{n}m`, the same calendar day `{n}h`,
/// anything older a date. Calendar days and dates follow the time zone of `now`.
/// Future timestamps (clock skew) count as `now`.
pub fn format_timestamp<Tz>(timestamp: DateTime<Utc>, now: DateTime<Tz>, style: TimestampStyle) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let elapsed = now.with_timezone(&Utc) - timestamp;

    if elapsed.num_seconds() < 60 {
        return "now".to_string();
    }
    if elapsed.num_minutes() < 60 {
        return format!("{}m", elapsed.num_minutes());
    }

    let local = timestamp.with_timezone(&now.timezone());
    if local.date_naive() == now.date_naive() {
        return format!("{}h", elapsed.num_hours());
    }

    match style {
        TimestampStyle::Short => local.format("%b %-d").to_string(),
        TimestampStyle::Long => local.format("%b %-d, %Y").to_string(),
    }
}

/// `format_timestamp` against the local clock
pub fn time_ago(timestamp: DateTime<Utc>, style: TimestampStyle) -> String {
    format_timestamp(timestamp, Local::now(), style)
}
