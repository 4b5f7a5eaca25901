use crate::config::Config;
use crate::playback::PlaybackService;
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use mediavault_db::DbPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod error;
pub mod routes_playback;
pub mod routes_upload;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub playback: Arc<PlaybackService>,
}

impl AppContext {
    /// Build the context with the subprocess encoder gateway.
    pub fn new(config: Config, db_pool: DbPool) -> Result<Self> {
        let playback = PlaybackService::from_config(&config, db_pool)
            .context("Failed to initialise playback service")?;
        Ok(Self::with_playback(config, playback))
    }

    pub fn with_playback(config: Config, playback: PlaybackService) -> Self {
        Self {
            config: Arc::new(config),
            playback: Arc::new(playback),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = cors_layer(&ctx.config.server.cors_origins);
    let storage = &ctx.config.storage;

    let api = routes_playback::playback_routes()
        .merge(routes_upload::upload_routes(&ctx.config.upload));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .nest("/api", api)
        // Published uploads and generated thumbnails
        .nest_service("/uploads", ServeDir::new(storage.uploads_dir()))
        .nest_service("/thumbnails", ServeDir::new(storage.thumbnails_dir()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::HEAD])
        .allow_headers([header::CONTENT_TYPE, header::RANGE])
        .expose_headers([header::CONTENT_RANGE, header::ACCEPT_RANGES]);

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(config: Config, db_pool: DbPool) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    for dir in [
        config.storage.uploads_dir(),
        config.storage.hls_dir(),
        config.storage.thumbnails_dir(),
    ] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory: {:?}", dir))?;
    }

    let ctx = AppContext::new(config, db_pool)?;
    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
