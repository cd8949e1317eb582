//! Activity classifier: turns merged spans into per-user, per-day totals and
//! an Active / Logged Out status.
//!
//! Status and duration intentionally read different inputs: status looks at
//! raw ledger rows (is anything still open?), duration sums merged spans
//! clipped to the day. For a past day the stated rule marks the day Active
//! whenever any session logged that day was never closed; an abandoned
//! session is indistinguishable from genuine activity. Implemented as stated,
//! pending a product decision.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::session::SessionRecord;
use crate::services::intervals::{merge_spans, Span};
use crate::utils::time::{day_bounds_utc, local_date, round_minutes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivityStatus {
    Active,
    #[serde(rename = "Logged Out")]
    LoggedOut,
}

/// One report row: a principal's logged-in total for a calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyActivity {
    pub user_email: String,
    pub date: NaiveDate,
    #[serde(rename = "totalDuration")]
    pub total_duration: i64,
    pub status: ActivityStatus,
}

/// Sums the parts of `spans` that fall within `[day_start, day_end)`, in
/// whole minutes. An open end is clipped to `min(now, day_end)`.
pub fn clipped_minutes(
    spans: &[Span],
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> i64 {
    let mut total = Duration::zero();
    for span in spans {
        let start = span.start.max(day_start);
        let end = span.end.unwrap_or(now).min(day_end);
        if end > start {
            total = total + (end - start);
        }
    }
    round_minutes(total)
}

/// Status rule from the report contract. `records` are every raw row for the
/// user in the lookback window.
///
/// - `date == today`: Active iff any of the user's records is still open.
/// - past date: Active unless every record logged on that local day was
///   closed.
pub fn classify_day(
    records: &[&SessionRecord],
    date: NaiveDate,
    today: NaiveDate,
    tz: &Tz,
) -> ActivityStatus {
    let active = if date == today {
        records.iter().any(|r| r.is_open())
    } else {
        records
            .iter()
            .filter(|r| local_date(r.login_time, tz) == date)
            .any(|r| r.is_open())
    };
    if active {
        ActivityStatus::Active
    } else {
        ActivityStatus::LoggedOut
    }
}

/// Builds the per-(user, day) activity report from raw ledger rows.
/// Output is sorted by date descending, then email ascending.
pub fn build_daily_report(
    records: &[SessionRecord],
    tz: &Tz,
    now: DateTime<Utc>,
) -> Vec<DailyActivity> {
    let today = now.with_timezone(tz).date_naive();

    let mut by_user: BTreeMap<&str, Vec<&SessionRecord>> = BTreeMap::new();
    for record in records {
        by_user
            .entry(record.user_email.as_str())
            .or_default()
            .push(record);
    }

    let mut report = Vec::new();
    for (email, user_records) in &by_user {
        let mut by_day: BTreeMap<NaiveDate, Vec<&SessionRecord>> = BTreeMap::new();
        for record in user_records {
            by_day
                .entry(local_date(record.login_time, tz))
                .or_default()
                .push(record);
        }

        for (date, day_records) in &by_day {
            let spans = merge_spans(day_records.iter().map(|r| Span::from(*r)).collect());
            let (day_start, day_end) = day_bounds_utc(*date, tz);
            let total_duration = clipped_minutes(&spans, day_start, day_end, now);
            let status = classify_day(user_records, *date, today, tz);

            report.push(DailyActivity {
                user_email: (*email).to_string(),
                date: *date,
                total_duration,
                status,
            });
        }
    }

    report.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.user_email.cmp(&b.user_email))
    });
    report
}
