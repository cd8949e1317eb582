use std::time::Duration;

use axum::{
    extract::{Extension, State},
    http::{header, StatusCode},
    response::AppendHeaders,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::user::{LoginRequest, LoginResponse, LogoutRequest, RegisterRequest,
        ResetPasswordRequest, UserResponse},
    repositories::{session as session_repo, user as user_repo},
    services::tokens,
    state::AppState,
    utils::{
        cookies::{
            build_auth_cookie, build_clear_cookie, CookieOptions, SameSite, ACCESS_COOKIE_NAME,
            REFRESH_COOKIE_NAME,
        },
        jwt::{sign_access_token, AccessClaims},
        password::{hash_password, verify_password},
    },
};

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();

    if user_repo::find_user_by_email(&state.pool, &email)
        .await
        .map_err(AppError::from)?
        .is_some()
    {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let role = payload.role.unwrap_or_default();
    let user_id = user_repo::insert_user(&state.pool, &email, &password_hash, role)
        .await
        .map_err(AppError::from)?;

    let claims = AccessClaims::new(
        user_id,
        email,
        Some(role.as_str().to_string()),
        state.config.access_token_expiry_minutes,
    );
    let token = sign_access_token(&claims, &state.config.jwt_secret)?;

    tracing::info!(user_id, role = role.as_str(), "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "userId": user_id,
            "role": role.as_str(),
            "token": token,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<
    (
        AppendHeaders<[(header::HeaderName, String); 2]>,
        Json<LoginResponse>,
    ),
    AppError,
> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::MissingCredentials("Missing email or password"));
    }

    let user = user_repo::find_user_by_email(&state.pool, &email)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let pair = tokens::issue_token_pair(&state.config, state.cache.as_ref(), &user).await?;

    session_repo::open_session(&state.pool, &user.email, Utc::now())
        .await
        .map_err(AppError::from)?;

    let access_cookie = build_auth_cookie(
        ACCESS_COOKIE_NAME,
        &pair.access_token,
        Duration::from_secs(state.config.access_token_expiry_minutes as u64 * 60),
        CookieOptions {
            secure: state.config.cookie_secure,
            same_site: SameSite::Lax,
        },
    );
    let refresh_cookie = build_auth_cookie(
        REFRESH_COOKIE_NAME,
        &pair.refresh_token,
        Duration::from_secs(state.config.refresh_token_expiry_days as u64 * 24 * 60 * 60),
        CookieOptions {
            secure: state.config.cookie_secure,
            same_site: SameSite::Strict,
        },
    );

    tracing::info!(email = %user.email, "login succeeded");
    let response = LoginResponse {
        success: true,
        user: UserResponse::from(user),
        access_token: pair.access_token,
    };

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, access_cookie),
            (header::SET_COOKIE, refresh_cookie),
        ]),
        Json(response),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutRequest>,
) -> Result<
    (
        AppendHeaders<[(header::HeaderName, String); 2]>,
        Json<Value>,
    ),
    AppError,
> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::BadRequest("Missing email".into()));
    }

    let closed = session_repo::close_latest_session(&state.pool, &email, Utc::now()).await?;
    tokens::revoke_refresh_token(state.cache.as_ref(), &email).await?;

    let opts = CookieOptions {
        secure: state.config.cookie_secure,
        same_site: SameSite::Strict,
    };

    tracing::info!(%email, duration_minutes = closed.duration_minutes, "logout succeeded");
    Ok((
        AppendHeaders([
            (header::SET_COOKIE, build_clear_cookie(ACCESS_COOKIE_NAME, opts)),
            (header::SET_COOKIE, build_clear_cookie(REFRESH_COOKIE_NAME, opts)),
        ]),
        Json(json!({
            "success": true,
            "message": "Logged out",
            "duration": format!("{} minutes", closed.duration_minutes),
        })),
    ))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::BadRequest("Missing fields".into()));
    }

    let password_hash = hash_password(&payload.new_password)?;
    let updated = user_repo::update_password_hash(&state.pool, &email, &password_hash)
        .await
        .map_err(AppError::from)?;
    if !updated {
        return Err(AppError::NotFound("User not found".into()));
    }

    // Outstanding refresh tokens die with the revocation entry.
    tokens::revoke_refresh_token(state.cache.as_ref(), &email).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password reset successful",
    })))
}

pub async fn me(Extension(user): Extension<AuthUser>) -> Json<Value> {
    Json(json!({
        "id": user.id,
        "email": user.email,
        "role": user.role,
    }))
}
