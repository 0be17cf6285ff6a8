mod app_state;
mod config;
mod models;
mod routes;
mod services;

use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing staging-relay server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!(
        "staging_submissions_total",
        "Staging jobs accepted by a vendor"
    );
    metrics::describe_counter!(
        "staging_submissions_rate_limited_total",
        "Submissions rejected by the rate limiter"
    );
    metrics::describe_counter!(
        "staging_webhook_callbacks_total",
        "Vendor webhook callbacks received"
    );
    metrics::describe_counter!(
        "staging_webhook_undecodable_total",
        "Webhook callbacks whose body could not be decoded"
    );
    metrics::describe_counter!(
        "staging_rehost_failures_total",
        "Results published with the vendor URL after a rehost failure"
    );
    metrics::describe_counter!(
        "staging_recompress_fallback_total",
        "Recompressions that fell back to the original bytes"
    );
    metrics::describe_gauge!(
        "staging_result_store_records",
        "Result records currently retained"
    );

    // Create shared application state
    let state = AppState::from_config(&config).expect("Failed to initialize application state");

    // Background eviction keeps memory bounded through quiet stretches when
    // no callback-triggered sweep runs.
    let sweeper = state.results.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(300));
        loop {
            tick.tick().await;
            let swept = sweeper.sweep_expired(chrono::Utc::now());
            if swept > 0 {
                tracing::info!(swept, "expired staging results evicted");
            }
            metrics::gauge!("staging_result_store_records").set(sweeper.len() as f64);
        }
    });

    // Build API routes
    let app = routes::api_router(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // 10 MB limit

    tracing::info!("Starting staging-relay on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
