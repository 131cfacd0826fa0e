use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::api::{UpdateUserRequest, UserView};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/user/me
pub async fn me_get(Extension(AuthUser(user)): Extension<AuthUser>) -> ApiResult<UserView> {
    Ok(ApiResponse::success(UserView::from(&user)))
}

/// PUT /api/user/me - email and name required, password optional
pub async fn me_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<UserView> {
    update_me(state, auth, payload, false).await
}

/// PATCH /api/user/me - any subset of email, name, password
pub async fn me_patch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<UserView> {
    update_me(state, auth, payload, true).await
}

async fn update_me(
    state: AppState,
    AuthUser(user): AuthUser,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
    partial: bool,
) -> ApiResult<UserView> {
    let Json(payload) = payload?;
    let changes = payload.validate(partial, state.config.security.min_password_length)?;

    let user = state.identity().update_profile(user, changes).await?;
    tracing::info!("Updated profile of {}", user);

    Ok(ApiResponse::success(UserView::from(&user)))
}
