use dotenvy::dotenv;
use tokio::net::TcpListener;

use rejuvenators::rejuvenators_config::ServerConfig;
use rejuvenators::router::init_router;
use rejuvenators::state::init_app_state;
use rejuvenators_observability::{init_metrics, init_tracing, metrics_app, shutdown_tracer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let server_config = ServerConfig::from_env();
    let state = init_app_state().await?;
    let app = init_router(state);

    if let Some(handle) = init_metrics() {
        let metrics_address = format!("{}:{}", server_config.host, server_config.metrics_port);
        let metrics_listener = TcpListener::bind(&metrics_address).await?;
        tracing::info!(address = %metrics_address, "Metrics endpoint listening");
        tokio::spawn(async move {
            if let Err(err) = axum::serve(metrics_listener, metrics_app(handle)).await {
                tracing::error!(error = %err, "Metrics server stopped");
            }
        });
    }

    let address = server_config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");
    tracing::info!("Swagger UI available at http://{}/swagger-ui", address);
    tracing::info!("Scalar UI available at http://{}/scalar", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tracer().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
