use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tour_api::{AppState, config::Config, create_app};
use tour_core::{TourStore, adapters::in_memory_store::InMemoryTourStore};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    // Initialize tracing (logging)
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting Tour API v{}...", env!("CARGO_PKG_VERSION"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Running in {} mode", config.environment);

    let store: Arc<dyn TourStore> = Arc::new(InMemoryTourStore::default());
    let app = create_app(AppState::new(store, &config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Tour API listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap_or_else(|e| {
        panic!("Failed to bind to address {}: {}", addr, e);
    });

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .unwrap_or_else(|e| {
            panic!("Server failed to run: {}", e);
        });
}
