use dotenvy::dotenv;
use listings_frontend::config::get_configuration;
use listings_frontend::services::upstream_client::UpstreamClient;
use listings_frontend::startup::build_router;
use listings_frontend::AppState;
use service_core::observability::logging::init_tracing;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "listings-frontend",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    listings_frontend::services::metrics::init_metrics()?;

    let upstream = UpstreamClient::new(&configuration.upstream)?;
    upstream.ensure_resolvable().await.map_err(|e| {
        tracing::error!("Upstream is unreachable: {}", e);
        anyhow::anyhow!("{}", e)
    })?;

    let state = AppState::new(Arc::new(upstream), configuration.session.clone());
    let app = build_router(state, &configuration.server.static_dir);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!(
        upstream = %configuration.upstream.url,
        "Starting listings-frontend on {}",
        address
    );
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
