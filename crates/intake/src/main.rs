use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use daflow_intake::{router, IntakeConfig};
use daflow_workflow::CompletionRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daflow_intake=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = IntakeConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded intake configuration");

    // --- Registry and routes ---
    let registry = Arc::new(CompletionRegistry::new());
    let app = router(registry).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Webhook intake listening");

    axum::serve(listener, app).await?;
    Ok(())
}
