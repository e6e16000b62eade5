pub mod handlers;
pub mod state;
pub mod url_validation;

use crate::config::Config;
use crate::error::Result;
use crate::hls::{MANIFEST_PATH, SEGMENT_PATH};
use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use state::AppState;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Header carrying the running build version on every response
pub const VERSION_HEADER: &str = "x-hls-proxy-version";

/// Build the application router with all routes and middleware
pub fn build_router(config: Config) -> Result<Router> {
    let state = AppState::new(config)?;

    // Browser front-ends on other origins post JSON here, so preflight is needed.
    let history_routes = Router::new()
        .route(
            "/api/history",
            get(handlers::history::list_history)
                .post(handlers::history::create_history)
                .delete(handlers::history::clear_history),
        )
        .layer(CorsLayer::permissive());

    Ok(Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics))
        .route(MANIFEST_PATH, get(handlers::manifest::serve_manifest))
        .route(SEGMENT_PATH, get(handlers::segment::serve_segment))
        .merge(history_routes)
        .layer(middleware::from_fn(version_header))
        .with_state(state))
}

/// Start the Axum HTTP server
pub async fn start(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);

    let app = build_router(config)?;

    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("🚀 Proxy listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}

async fn version_header(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response.headers_mut().insert(
        VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
