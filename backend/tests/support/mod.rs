#![allow(dead_code)]

use sqlx::postgres::PgPoolOptions;
use storekeeper_backend::{
    config::Config,
    services::revocation::SharedRevocationCache,
    state::AppState,
};

pub const TEST_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/storekeeper_test".into(),
        jwt_secret: TEST_SECRET.into(),
        access_token_expiry_minutes: 15,
        refresh_token_expiry_days: 7,
        session_lookback_days: 7,
        session_retention_days: 30,
        time_zone: chrono_tz::UTC,
        cookie_secure: false,
    }
}

/// The auth gate never touches the pool, so a lazy (unconnected) pool is
/// enough: no database is required for these tests.
pub fn test_state(cache: SharedRevocationCache) -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/storekeeper_test")
        .expect("lazy pool");
    AppState::new(pool, test_config(), cache)
}
