use axum::{extract::State, Json};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::{
    error::AppError,
    repositories::session as session_repo,
    services::activity::{build_daily_report, DailyActivity},
    state::AppState,
    utils::time::today_local,
};

#[derive(Debug, Serialize)]
pub struct SessionReportResponse {
    pub date: NaiveDate,
    pub sessions: Vec<DailyActivity>,
}

/// Admin report: per-user, per-day logged-in time over the lookback window.
/// Derived on every call from the raw ledger; nothing here is persisted.
pub async fn user_session_info(
    State(state): State<AppState>,
) -> Result<Json<SessionReportResponse>, AppError> {
    let now = Utc::now();

    // Retention runs first so the lookback below reads a bounded window.
    let retention_cutoff = now - Duration::days(state.config.session_retention_days);
    let purged = session_repo::purge_older_than(&state.pool, retention_cutoff)
        .await
        .map_err(AppError::from)?;
    if purged > 0 {
        tracing::info!(purged, "purged session rows past retention");
    }

    let lookback_cutoff = now - Duration::days(state.config.session_lookback_days);
    let records = session_repo::list_sessions_since(&state.pool, lookback_cutoff)
        .await
        .map_err(AppError::from)?;

    let sessions = build_daily_report(&records, &state.config.time_zone, now);

    Ok(Json(SessionReportResponse {
        date: today_local(&state.config.time_zone),
        sessions,
    }))
}
