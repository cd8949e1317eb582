//! Session ledger: login/logout timestamps per user email. Append-only
//! except for the single logout update that closes an open row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::session::{ClosedSession, SessionRecord};
use crate::repositories::transaction::{begin_transaction, commit_transaction};
use crate::utils::time::round_minutes;

/// Inserts a new open session row. Deliberately does not check for existing
/// open rows: concurrent logins from multiple devices are legal.
pub async fn open_session(
    pool: &PgPool,
    email: &str,
    login_time: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO user_sessions (user_email, login_time) VALUES ($1, $2) RETURNING id",
    )
    .bind(email)
    .bind(login_time)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Closes the most recent open session for `email`, computing the duration
/// in whole minutes. The candidate row is locked (`FOR UPDATE`) inside one
/// transaction so concurrent logouts cannot close the same row twice or pick
/// the wrong one.
pub async fn close_latest_session(
    pool: &PgPool,
    email: &str,
    logout_time: DateTime<Utc>,
) -> Result<ClosedSession, AppError> {
    let mut tx = begin_transaction(pool).await?;

    let candidate: Option<(i64, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT id, login_time
        FROM user_sessions
        WHERE user_email = $1 AND logout_time IS NULL
        ORDER BY login_time DESC
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(email)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| AppError::StoreUnavailable(e.into()))?;

    let Some((id, login_time)) = candidate else {
        return Err(AppError::NoActiveSession);
    };

    let duration_minutes = round_minutes(logout_time - login_time);

    sqlx::query(
        "UPDATE user_sessions SET logout_time = $1, duration_minutes = $2 WHERE id = $3",
    )
    .bind(logout_time)
    .bind(duration_minutes)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::StoreUnavailable(e.into()))?;

    commit_transaction(tx).await?;

    Ok(ClosedSession {
        id,
        duration_minutes,
    })
}

/// Retention policy: drops rows whose login precedes `cutoff`. Must run
/// before any read that assumes a bounded lookback window.
pub async fn purge_older_than(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_sessions WHERE login_time < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// All session rows in the lookback window, ordered for grouping by user.
pub async fn list_sessions_since(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<SessionRecord>, sqlx::Error> {
    sqlx::query_as::<_, SessionRecord>(
        r#"
        SELECT id, user_email, login_time, logout_time, duration_minutes
        FROM user_sessions
        WHERE login_time >= $1
        ORDER BY user_email ASC, login_time ASC
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await
}

/// Removes every ledger row for `email`. Used when an account is deleted.
pub async fn delete_sessions_for_email(pool: &PgPool, email: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_sessions WHERE user_email = $1")
        .bind(email)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
