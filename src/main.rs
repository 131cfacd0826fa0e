use recipe_api::{app, config, database, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("recipe_api=info,tower_http=info")),
        )
        .init();

    let config = config::config().clone();
    tracing::info!("Starting Recipe API in {:?} mode", config.environment);

    if recipe_api::is_development!() {
        tracing::warn!("Running with development defaults; set SECURITY_JWT_SECRET before deploying");
    }
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET must be set outside development");
    }

    let store = database::open_store(&config.database).await?;
    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(store, config);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Recipe API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
