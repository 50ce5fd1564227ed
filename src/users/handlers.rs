use axum::{
    extract::State,
    http::{header::LOCATION, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::UserResponse;
use super::repo_types::{NewUser, UserPatch};
use crate::{
    auth::AuthUser,
    errors::{ApiError, ApiResult},
    extract::ApiJson,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users", get(get_current_user).post(create_user).put(update_current_user))
}

/// GET /users: the authenticated user.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn get_current_user(AuthUser(identity): AuthUser) -> Json<UserResponse> {
    Json(UserResponse {
        user: identity.into(),
    })
}

/// POST /users: registration. Open to anyone.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, [(axum::http::HeaderName, &'static str); 1])> {
    let user = state.users.create_user(payload).await?;
    info!(user_id = %user.id, email = %user.email_address, "user registered");
    Ok((StatusCode::CREATED, [(LOCATION, "/")]))
}

/// PUT /users: partial update of the caller's own record.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn update_current_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(patch): ApiJson<UserPatch>,
) -> ApiResult<StatusCode> {
    state
        .users
        .update_user(identity.id, patch)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!("user updated");
    Ok(StatusCode::NO_CONTENT)
}
