//! Auth gate: the request-time consumer of the token service. Every
//! protected route goes through here, and this is the only place that writes
//! the access-token cookie.
//!
//! Per-request state machine:
//!   access valid                  -> proceed
//!   access malformed              -> 403 TOKEN_INVALID
//!   access expired/absent,
//!     no refresh cookie           -> 403 TOKEN_EXPIRED (401 when neither token present)
//!     refresh invalid or expired  -> 403
//!     refresh != cached value     -> 403 TOKEN_REVOKED
//!     refresh matches cache       -> new access cookie, proceed

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    services::tokens,
    state::AppState,
    utils::cookies::{
        build_auth_cookie, extract_cookie_value, CookieOptions, SameSite, ACCESS_COOKIE_NAME,
        REFRESH_COOKIE_NAME,
    },
    utils::jwt::{verify_access_token, TokenError},
};

/// Authenticated principal attached to the request extensions.
///
/// `role` is `None` when the access token was minted through the refresh
/// path; such a request cannot pass the admin gate until the user logs in
/// again.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case("admin"))
    }
}

pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (user, renewed_cookie) = authenticate_request(&state, request.headers()).await?;
    tracing::debug!(email = %user.email, renewed = renewed_cookie.is_some(), "request authenticated");
    request.extensions_mut().insert(user);

    let mut response = next.run(request).await;
    append_renewed_cookie(&mut response, renewed_cookie);
    Ok(response)
}

/// Auth + require the admin role for admin-only routes.
pub async fn auth_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (user, renewed_cookie) = authenticate_request(&state, request.headers()).await?;
    if !user.is_admin() {
        return Err(AppError::Forbidden("Access denied: Admins only".into()));
    }
    request.extensions_mut().insert(user);

    let mut response = next.run(request).await;
    append_renewed_cookie(&mut response, renewed_cookie);
    Ok(response)
}

/// Runs the state machine. On a successful refresh, also returns the
/// Set-Cookie value carrying the replacement access token.
async fn authenticate_request(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(AuthUser, Option<String>), AppError> {
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token);

    let access_token = cookie_header
        .and_then(|raw| extract_cookie_value(raw, ACCESS_COOKIE_NAME))
        .or_else(|| bearer.map(str::to_string));
    let refresh_token = cookie_header.and_then(|raw| extract_cookie_value(raw, REFRESH_COOKIE_NAME));

    if access_token.is_none() && refresh_token.is_none() {
        return Err(AppError::MissingCredentials(
            "No refresh token or access token provided",
        ));
    }

    if let Some(token) = access_token {
        match verify_access_token(&token, &state.config.jwt_secret) {
            Ok(claims) => {
                return Ok((
                    AuthUser {
                        id: claims.id,
                        email: claims.email,
                        role: claims.role,
                    },
                    None,
                ))
            }
            Err(TokenError::Invalid) => {
                return Err(AppError::TokenInvalid("Invalid access token"))
            }
            Err(TokenError::Expired) => {}
        }
    }

    let Some(refresh_token) = refresh_token else {
        return Err(AppError::TokenExpired(
            "Access token expired and no refresh token available",
        ));
    };

    let (new_access, claims) =
        tokens::refresh_access_token(&state.config, state.cache.as_ref(), &refresh_token).await?;

    let cookie = build_auth_cookie(
        ACCESS_COOKIE_NAME,
        &new_access,
        Duration::from_secs(state.config.access_token_expiry_minutes as u64 * 60),
        CookieOptions {
            secure: state.config.cookie_secure,
            same_site: SameSite::Strict,
        },
    );

    Ok((
        AuthUser {
            id: claims.id,
            email: claims.email,
            role: None,
        },
        Some(cookie),
    ))
}

fn append_renewed_cookie(response: &mut Response, cookie: Option<String>) {
    if let Some(cookie) = cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(rest.trim_start())
    } else {
        None
    }
}
