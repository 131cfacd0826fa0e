use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::api::{CreateUserRequest, TokenRequest, TokenView, UserView};
use crate::auth::generate_token;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UserFields;
use crate::state::AppState;

/// POST /api/user/create - register a new account
///
/// ```json
/// { "email": "test@example.com", "password": "testpass", "name": "Test" }
/// ```
///
/// Responds 201 with `{email, name}`. The password is never echoed.
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<UserView> {
    let Json(payload) = payload?;
    let account = payload.validate(state.config.security.min_password_length)?;

    let user = state
        .identity()
        .create_user(
            Some(account.email.as_str()),
            Some(account.password.as_str()),
            UserFields::named(account.name),
        )
        .await?;

    Ok(ApiResponse::created(UserView::from(&user)))
}

/// POST /api/user/token - exchange email and password for a token
///
/// Bad credentials are a 400 with code `AUTHENTICATION`, not a 401.
pub async fn create_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> ApiResult<TokenView> {
    let Json(payload) = payload?;
    let (email, password) = payload.validate()?;

    let user = state.identity().authenticate(&email, &password).await?;
    let token = generate_token(&state.config.security, &user)?;

    Ok(ApiResponse::success(TokenView { token }))
}
