//! Serve command - Starts the HTTP server.

use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Database};

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    let addr = format!(
        "{}:{}",
        args.host.as_deref().unwrap_or(&config.server_host),
        args.port.unwrap_or(config.server_port)
    );

    let app_state = if args.in_memory {
        tracing::warn!("Serving from the in-memory store; data is lost on exit");
        AppState::in_memory(config)
    } else {
        let db = Database::connect(&config).await?;
        tracing::info!("Database connected");

        // Redis is optional: without it locks are process-local and auth is not rate limited
        let cache = match Cache::try_connect(&config).await {
            Ok(cache) => {
                tracing::info!("Redis cache connected");
                Some(Arc::new(cache))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, continuing without it");
                None
            }
        };

        AppState::from_config(Arc::new(db), cache, config)
    };

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}
