//! services/sensei/src/bin/sensei.rs

use sensei_lib::{
    adapters::{FileSecretStore, FsPoseCatalog, OpenAiAssistantAdapter},
    config::Config,
    error::ApiError,
    web::{mood_process, rest::ApiDoc, router, AppState, SessionState},
};
use axum::http::Method;
use axum::Router;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting Code Sensei...");

    // --- 2. Initialize Service Adapters ---
    let assistant = Arc::new(OpenAiAssistantAdapter::new(
        config.assistant_api_base.clone(),
        config.assistant_model.clone(),
        config.assistant_timeout,
    ));
    let secrets = Arc::new(FileSecretStore::new(config.secrets_path.clone()));

    let attentive_dir = config.media_root.join("attentive");
    if !attentive_dir.is_dir() {
        warn!(
            "Fallback pose directory {} is missing; mood updates may be skipped.",
            attentive_dir.display()
        );
    }
    let poses = Arc::new(FsPoseCatalog::new(config.media_root.clone(), config.pose_seed));

    // --- 3. Build the Shared AppState ---
    let session = Arc::new(Mutex::new(SessionState::new()));
    let app_state = Arc::new(AppState {
        config: config.clone(),
        assistant,
        secrets,
        poses,
        session: session.clone(),
    });

    // --- 4. Start the Mood Process ---
    let mood_token = CancellationToken::new();
    let mood_task = {
        let app_state = app_state.clone();
        let token = mood_token.clone();
        tokio::spawn(mood_process(app_state, session, token))
    };

    // --- 5. Create the Web Router ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);
    let app = Router::new()
        .merge(router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // --- 6. Start the Server ---
    info!("Listening on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- 7. Cleanup ---
    mood_token.cancel();
    if let Err(e) = mood_task.await {
        error!("Mood process ended abnormally: {}", e);
    }
    info!("Code Sensei stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}
