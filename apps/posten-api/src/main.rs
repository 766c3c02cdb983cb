use std::sync::Arc;

use chrono::Local;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use posten_api::api::{self, AppState};
use posten_api::config::Config;
use posten_api::domain::delivery::DeliveryService;
use posten_api::infrastructure::{PostenClient, UpstreamStatus};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("posten_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    // Upstream client shares the health tracker with the API
    let upstream_status = UpstreamStatus::new();
    let client = PostenClient::new(
        &config.posten_base_url,
        config.timeouts.clone(),
        config.retry.clone(),
        upstream_status.clone(),
    )
    .expect("Failed to build HTTP client");

    tracing::info!("Using upstream {}", config.posten_base_url);

    let delivery = DeliveryService::new(
        Arc::new(client),
        config.cache_capacity,
        Local::now().date_naive(),
    );
    let state = AppState::new(delivery, upstream_status, config.static_dir.clone());

    let app = api::router(state);

    // Start server
    tracing::info!("Server listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
