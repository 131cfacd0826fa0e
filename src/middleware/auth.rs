use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::access::OwnerScope;
use crate::auth::{extract_token, validate_token};
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// The user resolved from the request token, inserted by [`require_token`].
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn scope(&self) -> OwnerScope {
        OwnerScope::for_user(&self.0)
    }
}

/// Token authentication middleware.
///
/// Rejects the request with 401 unless the token is valid and belongs to an
/// existing, active user.
pub async fn require_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&headers)?;
    let claims = validate_token(&state.config.security, token)?;

    let user = state
        .store
        .find_user(claims.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| {
            tracing::warn!("Token for unknown or inactive user {}", claims.user_id);
            ApiError::unauthorized("User inactive or deleted.")
        })?;

    tracing::debug!("Authenticated request for {}", user);
    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}
