use std::sync::Arc;

use poster::{config::ServiceConfig, create_router, service::PosterService, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "poster=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env();
    let service = PosterService::from_config(&config)?;
    if let Some(dir) = &config.cache_dir {
        tracing::info!("caching snapshots under {}", dir.display());
    }

    let state = AppState {
        service: Arc::new(service),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("starting poster service on http://{}", listener.local_addr()?);
    tracing::info!("  POST /api/poster - render a poster");
    tracing::info!("  GET  /api/themes - list themes");
    tracing::info!("  GET  /api/sizes  - list sizes");
    axum::serve(listener, app).await?;

    Ok(())
}
