use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, Query, State},
    Extension, Json,
};

use crate::api::{RecipeDetailView, RecipeImageView, RecipeRequest, RecipeView};
use crate::database::models::{AttributeKind, Recipe};
use crate::error::ApiError;
use crate::filter::{RecipeFilter, RecipeQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::images;
use crate::state::AppState;

const NOT_FOUND: &str = "Not found.";

async fn load(state: &AppState, auth: &AuthUser, id: i64) -> Result<Recipe, ApiError> {
    state
        .store
        .find_recipe(&auth.scope(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

/// GET /api/recipe/recipes[?tags=1,2&ingredients=3]
///
/// Ids within one parameter are alternatives; both parameters must match.
pub async fn recipes_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<RecipeQuery>,
) -> ApiResult<Vec<RecipeView>> {
    let filter = RecipeFilter::from_query(&query)?;
    let recipes = state.store.list_recipes(&auth.scope(), &filter).await?;

    Ok(ApiResponse::success(recipes.into_iter().map(RecipeView::from).collect()))
}

/// POST /api/recipe/recipes
pub async fn recipes_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> ApiResult<RecipeView> {
    let Json(payload) = payload?;
    let draft = payload.validate(state.store.as_ref(), true).await?.into_draft()?;

    let recipe = state.store.insert_recipe(&auth.scope(), draft).await?;
    tracing::info!("Created recipe {} '{}' for user {}", recipe.id, recipe, auth.0.id);

    Ok(ApiResponse::created(RecipeView::from(recipe)))
}

/// GET /api/recipe/recipes/:id - tags and ingredients expanded
pub async fn recipe_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<RecipeDetailView> {
    let recipe = load(&state, &auth, id).await?;

    let tags = state.store.find_attributes(AttributeKind::Tag, &recipe.tag_ids).await?;
    let ingredients = state
        .store
        .find_attributes(AttributeKind::Ingredient, &recipe.ingredient_ids)
        .await?;

    Ok(ApiResponse::success(RecipeDetailView::new(
        recipe,
        tags,
        ingredients,
        &state.config.media,
    )))
}

/// PUT /api/recipe/recipes/:id - title, time_minutes and price required
pub async fn recipe_put(
    state: State<AppState>,
    auth: Extension<AuthUser>,
    id: Path<i64>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> ApiResult<RecipeView> {
    update(state, auth, id, payload, false).await
}

/// PATCH /api/recipe/recipes/:id
pub async fn recipe_patch(
    state: State<AppState>,
    auth: Extension<AuthUser>,
    id: Path<i64>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> ApiResult<RecipeView> {
    update(state, auth, id, payload, true).await
}

async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
    partial: bool,
) -> ApiResult<RecipeView> {
    let mut recipe = load(&state, &auth, id).await?;

    let Json(payload) = payload?;
    let changes = payload.validate(state.store.as_ref(), !partial).await?;
    changes.apply(&mut recipe);

    let recipe = state.store.update_recipe(&auth.scope(), &recipe).await?;
    Ok(ApiResponse::success(RecipeView::from(recipe)))
}

/// DELETE /api/recipe/recipes/:id
pub async fn recipe_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    if !state.store.delete_recipe(&auth.scope(), id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    tracing::info!("Deleted recipe {} of user {}", id, auth.0.id);

    Ok(ApiResponse::no_content())
}

/// POST /api/recipe/recipes/:id/upload-image
///
/// Multipart body with a single file part named `image`.
pub async fn recipe_upload_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<RecipeImageView> {
    let mut recipe = load(&state, &auth, id).await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| ApiError::field("image", "No file was submitted."))?;
    let path = images::save_recipe_image(&state.config.media, &filename, &bytes).await?;

    recipe.image = Some(path);
    let recipe = state.store.update_recipe(&auth.scope(), &recipe).await?;
    let image = recipe
        .image
        .as_deref()
        .map(|path| images::media_url(&state.config.media, path))
        .unwrap_or_default();

    Ok(ApiResponse::success(RecipeImageView { id: recipe.id, image }))
}
