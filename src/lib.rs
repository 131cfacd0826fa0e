pub mod access;
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::{MediaConfig, SecurityConfig};
pub use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        .merge(public_routes())
        // Protected
        .merge(protected_routes(state.clone()));

    let router = mount_media(router, &config.media).layer(
        ServiceBuilder::new()
            .layer(cors_layer(&config.security))
            .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
    );

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route("/api/user/create", post(public::create_user))
        .route("/api/user/token", post(public::create_token))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{attributes, recipes, user};

    Router::new()
        .route(
            "/api/user/me",
            get(user::me_get).put(user::me_put).patch(user::me_patch),
        )
        .route(
            "/api/recipe/tags",
            get(attributes::tags_list).post(attributes::tags_create),
        )
        .route(
            "/api/recipe/ingredients",
            get(attributes::ingredients_list).post(attributes::ingredients_create),
        )
        .route(
            "/api/recipe/recipes",
            get(recipes::recipes_list).post(recipes::recipes_create),
        )
        .route(
            "/api/recipe/recipes/:id",
            get(recipes::recipe_get)
                .put(recipes::recipe_put)
                .patch(recipes::recipe_patch)
                .delete(recipes::recipe_delete),
        )
        .route(
            "/api/recipe/recipes/:id/upload-image",
            post(recipes::recipe_upload_image),
        )
        .route_layer(from_fn_with_state(state, middleware::require_token))
}

/// Serve the media root under the media URL when that URL is a local path
fn mount_media(router: Router<AppState>, media: &MediaConfig) -> Router<AppState> {
    let prefix = media.url.trim_end_matches('/');
    if !prefix.starts_with('/') || prefix.is_empty() {
        tracing::warn!("MEDIA_URL '{}' is not a local path prefix; media will not be served", media.url);
        return router;
    }

    router.nest_service(prefix, ServeDir::new(&media.root))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
