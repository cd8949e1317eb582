use anyhow::anyhow;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
    pub session_lookback_days: i64,
    pub session_retention_days: i64,
    pub time_zone: Tz,
    pub cookie_secure: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/storekeeper".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "change-this-secret-before-deploying".to_string());

        let access_token_expiry_minutes = parse_env_i64("ACCESS_TOKEN_EXPIRY_MINUTES", 15);
        let refresh_token_expiry_days = parse_env_i64("REFRESH_TOKEN_EXPIRY_DAYS", 7);
        let session_lookback_days = parse_env_i64("SESSION_LOOKBACK_DAYS", 7);
        let session_retention_days = parse_env_i64("SESSION_RETENTION_DAYS", 30);

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let cookie_secure = match env::var("COOKIE_SECURE") {
            Ok(value) => value == "1" || value.eq_ignore_ascii_case("true"),
            Err(_) => env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        };

        Ok(Config {
            database_url,
            jwt_secret,
            access_token_expiry_minutes,
            refresh_token_expiry_days,
            session_lookback_days,
            session_retention_days,
            time_zone,
            cookie_secure,
        })
    }
}

fn parse_env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
