//! Interval merger: collapses a user's raw session records into the minimal
//! set of non-overlapping logged-in spans.

use chrono::{DateTime, Utc};

use crate::models::session::SessionRecord;

/// A contiguous logged-in span. `end == None` means the span is still open
/// (some underlying session has no logout yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Span {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// An open end behaves as +infinity when testing whether the next span
    /// connects to this one.
    fn reaches(&self, start: DateTime<Utc>) -> bool {
        match self.end {
            None => true,
            Some(end) => start <= end,
        }
    }

    fn absorb(&mut self, other: Span) {
        self.end = match (self.end, other.end) {
            (None, _) | (_, None) => None,
            (Some(a), Some(b)) => Some(a.max(b)),
        };
    }
}

impl From<&SessionRecord> for Span {
    fn from(record: &SessionRecord) -> Self {
        Span::new(record.login_time, record.logout_time)
    }
}

/// Merges overlapping or touching spans into the minimal ordered set.
///
/// Only sortedness matters, so the input order is irrelevant; merging the
/// output again reproduces it unchanged. If any span in a connected group is
/// open, the merged span for that group is open.
pub fn merge_spans(mut spans: Vec<Span>) -> Vec<Span> {
    if spans.is_empty() {
        return Vec::new();
    }

    spans.sort_by_key(|s| s.start);

    let mut merged = Vec::new();
    let mut current = spans[0];
    for span in spans.into_iter().skip(1) {
        if current.reaches(span.start) {
            current.absorb(span);
        } else {
            merged.push(current);
            current = span;
        }
    }
    merged.push(current);
    merged
}
