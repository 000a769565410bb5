use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

mod config;
mod db;
mod error;
mod handlers;
mod llm;
mod models;
mod pipeline;
mod state;
mod storage;
mod utils;

use config::Config;
use db::database::Database;
use handlers::{api, cards};
use llm::openai::OpenAiClient;
use llm::ModelClient;
use state::AppState;
use storage::CardImageStore;
use utils::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;
    let _guards = init_logging(&config.log_level);

    info!("Starting stat card studio");

    let db = Database::init(&config.database_url).await?;
    let images = CardImageStore::new(&config.card_storage_path);
    images.init().await?;

    let model: Option<Arc<dyn ModelClient>> = if config.ai_configured() {
        Some(Arc::new(OpenAiClient::new(&config)))
    } else {
        None
    };
    info!(
        "AI features: {}",
        if model.is_some() { "enabled" } else { "disabled" }
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::new(&config, db, images, model);

    let api_routes = Router::new()
        .route("/health", get(api::health))
        .route("/generate-stats", post(api::generate_stats))
        .route("/generate-image", post(api::generate_image))
        .route("/enhance-photo", post(api::enhance_photo))
        .route("/generate-portraits", post(api::generate_portraits))
        .route("/portraits/{session_id}", get(api::get_portraits))
        .route("/cards", post(cards::save_card).get(cards::list_cards))
        .route("/cards/{id}", get(cards::get_card))
        .route("/cards/{id}/image", get(cards::card_image));

    let app = Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Stat card studio listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Shutdown signal received");
}
