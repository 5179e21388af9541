use anyhow::anyhow;
use chrono::format::StrftimeItems;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub const MINUTE: i64 = 60 * NANOS_PER_SECOND;
pub const HOUR: i64 = 60 * MINUTE;
pub const DAY: i64 = 24 * HOUR;

pub fn unix_nano_to_time(unix_nano: i64) -> DateTime<Utc> {
    let secs = unix_nano.div_euclid(NANOS_PER_SECOND);
    let nsecs = unix_nano.rem_euclid(NANOS_PER_SECOND) as u32;
    DateTime::from_timestamp(secs, nsecs).unwrap_or_default()
}

pub fn time_to_unix_nano<Tz: TimeZone>(dt: &DateTime<Tz>) -> i64 {
    dt.timestamp() * NANOS_PER_SECOND + dt.timestamp_subsec_nanos() as i64
}

pub fn time_format(unix_nano: i64) -> String {
    let fmt = StrftimeItems::new("%Y-%m-%dT%H:%M:%SZ");
    format!("{}", unix_nano_to_time(unix_nano).format_with_items(fmt))
}

/// strftime formats the timestamp with a chrono/strftime pattern.
pub fn strftime(unix_nano: i64, pattern: &str) -> String {
    unix_nano_to_time(unix_nano).format(pattern).to_string()
}

/// parse_time accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (UTC midnight).
pub fn parse_time(s: &str) -> anyhow::Result<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(time_to_unix_nano(&dt));
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| anyhow!("unrecognized time \"{}\": {}", s, e))?;
    date_start(date).ok_or_else(|| anyhow!("time out of range: {}", s))
}

fn date_start(date: NaiveDate) -> Option<i64> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(time_to_unix_nano(&Utc.from_utc_datetime(&midnight)))
}

/// from_ymd returns the unix nano timestamp of midnight UTC on the given date.
pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<i64> {
    date_start(NaiveDate::from_ymd_opt(year, month, day)?)
}

/// from_year_day returns midnight UTC of the `ordinal` day (1-based) of `year`.
pub fn from_year_day(year: i32, ordinal: u32) -> Option<i64> {
    date_start(NaiveDate::from_yo_opt(year, ordinal)?)
}

/// year_day returns the year and the 1-based day of year of a timestamp.
pub fn year_day(unix_nano: i64) -> (i32, u32) {
    let t = unix_nano_to_time(unix_nano);
    (t.year(), t.ordinal())
}

pub fn day_start(unix_nano: i64) -> i64 {
    unix_nano.div_euclid(DAY) * DAY
}

pub fn month_start(unix_nano: i64) -> i64 {
    let t = unix_nano_to_time(unix_nano);
    from_ymd(t.year(), t.month(), 1).unwrap_or_else(|| day_start(unix_nano))
}

pub fn next_month_start(unix_nano: i64) -> i64 {
    let t = unix_nano_to_time(unix_nano);
    let (year, month) = if t.month() == 12 {
        (t.year() + 1, 1)
    } else {
        (t.year(), t.month() + 1)
    };
    from_ymd(year, month, 1).unwrap_or_else(|| day_start(unix_nano) + 31 * DAY)
}

/// days returns the start of every calendar day touched by `[start, end]`.
pub fn days(start: i64, end: i64) -> Vec<i64> {
    let mut days = vec![];
    let mut day = day_start(start);
    while day <= end {
        days.push(day);
        day += DAY;
    }
    days
}

/// months returns the start of every calendar month touched by `[start, end]`.
pub fn months(start: i64, end: i64) -> Vec<i64> {
    let mut months = vec![];
    let mut month = month_start(start);
    while month <= end {
        months.push(month);
        month = next_month_start(month);
    }
    months
}
