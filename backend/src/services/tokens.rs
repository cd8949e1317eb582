//! Token service: issues, verifies, and refreshes the access/refresh pair.
//!
//! Only this module mints tokens. Issuing a pair registers the refresh token
//! with the revocation cache, superseding whatever was cached for the
//! principal before; refreshing checks that exact string against the cache so
//! stolen or superseded tokens fail even while cryptographically valid.

use std::time::Duration as StdDuration;

use crate::{
    config::Config,
    error::AppError,
    models::user::User,
    services::revocation::{refresh_token_key, RevocationCache},
    utils::jwt::{
        sign_access_token, sign_refresh_token, verify_refresh_token, AccessClaims, RefreshClaims,
        TokenError,
    },
};

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints an access/refresh pair for `user` and records the refresh token as
/// the principal's single trusted one. The cache entry expires with the
/// refresh token itself.
pub async fn issue_token_pair(
    config: &Config,
    cache: &dyn RevocationCache,
    user: &User,
) -> Result<TokenPair, AppError> {
    let access_claims = AccessClaims::new(
        user.id,
        user.email.clone(),
        Some(user.role.as_str().to_string()),
        config.access_token_expiry_minutes,
    );
    let refresh_claims = RefreshClaims::new(
        user.id,
        user.email.clone(),
        config.refresh_token_expiry_days,
    );

    let access_token = sign_access_token(&access_claims, &config.jwt_secret)?;
    let refresh_token = sign_refresh_token(&refresh_claims, &config.jwt_secret)?;

    let ttl = StdDuration::from_secs(config.refresh_token_expiry_days as u64 * 24 * 60 * 60);
    cache
        .set(
            &refresh_token_key(&user.email),
            &refresh_token,
            Some(ttl),
        )
        .await
        .map_err(AppError::StoreUnavailable)?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Verifies a refresh token and, when it matches the cached value for its
/// principal, mints a replacement access token. The refresh token and its
/// cache entry are deliberately left untouched.
pub async fn refresh_access_token(
    config: &Config,
    cache: &dyn RevocationCache,
    refresh_token: &str,
) -> Result<(String, RefreshClaims), AppError> {
    let claims =
        verify_refresh_token(refresh_token, &config.jwt_secret).map_err(|e| match e {
            TokenError::Expired => AppError::TokenExpired("Refresh token expired or invalid"),
            TokenError::Invalid => AppError::TokenInvalid("Refresh token expired or invalid"),
        })?;

    let cached = cache
        .get(&refresh_token_key(&claims.email))
        .await
        .map_err(AppError::StoreUnavailable)?;
    match cached {
        Some(trusted) if trusted == refresh_token => {}
        _ => return Err(AppError::TokenRevoked),
    }

    // No role claim here: the refresh token only authorizes {id, email}.
    let access_claims = AccessClaims::new(
        claims.id,
        claims.email.clone(),
        None,
        config.access_token_expiry_minutes,
    );
    let access_token = sign_access_token(&access_claims, &config.jwt_secret)?;

    Ok((access_token, claims))
}

/// Deletes the principal's revocation entry, killing any outstanding refresh
/// token immediately.
pub async fn revoke_refresh_token(
    cache: &dyn RevocationCache,
    email: &str,
) -> Result<(), AppError> {
    cache
        .delete(&refresh_token_key(email))
        .await
        .map_err(AppError::StoreUnavailable)
}
