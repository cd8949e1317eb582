//! Maintenance entry point applying the session retention policy, intended
//! for a cron schedule.

use chrono::{Duration, Utc};
use storekeeper_backend::{config::Config, db::connection::create_pool, repositories::session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;

    let cutoff = Utc::now() - Duration::days(config.session_retention_days);
    let deleted = session::purge_older_than(&pool, cutoff).await?;
    if deleted > 0 {
        tracing::info!(deleted, "Deleted session rows past retention");
    }

    sqlx::query("VACUUM (ANALYZE) user_sessions")
        .execute(&pool)
        .await?;

    Ok(())
}
