use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}

/// Returns today's date in the configured timezone.
pub fn today_local(tz: &Tz) -> NaiveDate {
    now_in_timezone(tz).date_naive()
}

/// Returns the calendar date of `ts` in the configured timezone.
pub fn local_date(ts: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

/// Returns `[day_start, day_end)` in UTC for a civil date in the configured
/// timezone. A midnight that falls into a DST gap resolves to the earlier of
/// the two candidate instants, or the naive time read as UTC if none exists.
pub fn day_bounds_utc(date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_midnight_utc(date, tz);
    let end = match date.succ_opt() {
        Some(next) => local_midnight_utc(next, tz),
        None => start + Duration::days(1),
    };
    (start, end)
}

fn local_midnight_utc(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

/// Rounds a duration to whole minutes, matching how the session ledger
/// records `duration_minutes`.
pub fn round_minutes(duration: Duration) -> i64 {
    (duration.num_seconds() as f64 / 60.0).round() as i64
}
