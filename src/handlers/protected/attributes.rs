// Tags and ingredients share one shape and one set of rules; the route
// handlers only pick the AttributeKind.
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};

use crate::api::{AttributeRequest, AttributeView};
use crate::database::models::AttributeKind;
use crate::filter::{AttributeFilter, AttributeQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/recipe/tags[?assigned_only=1]
pub async fn tags_list(
    state: State<AppState>,
    auth: Extension<AuthUser>,
    query: Query<AttributeQuery>,
) -> ApiResult<Vec<AttributeView>> {
    list(AttributeKind::Tag, state, auth, query).await
}

/// POST /api/recipe/tags
pub async fn tags_create(
    state: State<AppState>,
    auth: Extension<AuthUser>,
    payload: Result<Json<AttributeRequest>, JsonRejection>,
) -> ApiResult<AttributeView> {
    create(AttributeKind::Tag, state, auth, payload).await
}

/// GET /api/recipe/ingredients[?assigned_only=1]
pub async fn ingredients_list(
    state: State<AppState>,
    auth: Extension<AuthUser>,
    query: Query<AttributeQuery>,
) -> ApiResult<Vec<AttributeView>> {
    list(AttributeKind::Ingredient, state, auth, query).await
}

/// POST /api/recipe/ingredients
pub async fn ingredients_create(
    state: State<AppState>,
    auth: Extension<AuthUser>,
    payload: Result<Json<AttributeRequest>, JsonRejection>,
) -> ApiResult<AttributeView> {
    create(AttributeKind::Ingredient, state, auth, payload).await
}

async fn list(
    kind: AttributeKind,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<AttributeQuery>,
) -> ApiResult<Vec<AttributeView>> {
    let filter = AttributeFilter::from_query(&query)?;
    let rows = state.store.list_attributes(kind, &auth.scope(), filter).await?;

    Ok(ApiResponse::success(rows.into_iter().map(AttributeView::from).collect()))
}

async fn create(
    kind: AttributeKind,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<AttributeRequest>, JsonRejection>,
) -> ApiResult<AttributeView> {
    let Json(payload) = payload?;
    let name = payload.validate()?;

    let attribute = state.store.insert_attribute(kind, &auth.scope(), &name).await?;
    tracing::info!("Created {} '{}' for user {}", kind.label(), attribute, auth.0.id);

    Ok(ApiResponse::created(AttributeView::from(attribute)))
}
