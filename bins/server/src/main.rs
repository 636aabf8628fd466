//! Sitecost API Server
//!
//! Main entry point for the cost reconciliation backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitecost_api::{AppState, create_router};
use sitecost_core::events::TracingEventSink;
use sitecost_shared::AppConfig;
use sitecost_store::{
    EnvelopeService, EnvelopeStore, ProjectStore, PurchaseOrderStore, TenderBoqStore,
    build_operator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitecost=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Build the storage operator
    let operator = build_operator(&config.storage)?;
    info!(provider = config.storage.name(), "Storage configured");

    // Create the envelope service
    let service = EnvelopeService::new(
        EnvelopeStore::new(operator.clone()),
        TenderBoqStore::new(operator.clone()),
        PurchaseOrderStore::new(operator.clone()),
        ProjectStore::new(operator),
        Arc::new(TracingEventSink),
    );

    // Create application state
    let state = AppState {
        service: Arc::new(service),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
