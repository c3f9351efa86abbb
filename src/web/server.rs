use axum::{routing::get, routing::post, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::api::catalog as catalog_handlers;
use super::api::radio as radio_handlers;
use super::api::tracker as tracker_handlers;
use super::api_doc::ApiDoc;
use super::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Tracker
        .route("/api/tracker/start", post(tracker_handlers::start))
        .route("/api/tracker/stop", post(tracker_handlers::stop))
        .route("/api/tracker/status", get(tracker_handlers::status))
        // Radio
        .route("/api/radio/split", post(radio_handlers::split))
        .route("/api/devices", get(catalog_handlers::devices))
        .route("/api/rigs", get(catalog_handlers::rigs))
        // Catalog
        .route("/api/satellites", get(catalog_handlers::satellites))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the control API until Ctrl-C, then stops any running session.
pub async fn run_server(state: AppState) -> std::io::Result<()> {
    let bind_addr = state.config.web.bind.clone();
    let tracker = state.tracker.clone();
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutting down");
        })
        .await?;

    if let Err(e) = tracker.lock().await.stop().await {
        log::error!("Failed to stop tracker: {}", e);
    }
    Ok(())
}
