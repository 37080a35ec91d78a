use chrono::{DateTime, NaiveDate, NaiveTime};

/// Format an epoch-milliseconds acquisition time as a `YYYY-MM-DD` UTC date.
/// Returns `None` when the timestamp is outside chrono's range.
pub fn epoch_millis_to_date(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Epoch milliseconds of 00:00 UTC on `date`
pub fn date_to_epoch_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}
