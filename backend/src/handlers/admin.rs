use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    repositories::{session as session_repo, user as user_repo},
    services::tokens,
    state::AppState,
};

pub async fn get_users(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let users = user_repo::list_users(&state.pool)
        .await
        .map_err(AppError::from)?;
    Ok(Json(json!({ "success": true, "users": users })))
}

/// Deletes a non-admin account along with its session rows and revocation
/// entry, so any outstanding refresh token dies with the account.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let user = user_repo::find_user_by_id(&state.pool, user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if user.is_admin() {
        return Err(AppError::Forbidden("Cannot delete admin user".into()));
    }

    let deleted = user_repo::delete_user_by_id(&state.pool, user_id)
        .await
        .map_err(AppError::from)?;
    if deleted == 0 {
        return Err(AppError::NotFound("User not found or already deleted".into()));
    }

    session_repo::delete_sessions_for_email(&state.pool, &user.email)
        .await
        .map_err(AppError::from)?;
    tokens::revoke_refresh_token(state.cache.as_ref(), &user.email).await?;

    tracing::info!(user_id, email = %user.email, "user deleted");
    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    })))
}
