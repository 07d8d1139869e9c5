//! HTTP entry point: wires the in-memory stores, crypto components, and the
//! logging decorator into the device service, then serves the v0 API.

mod api;
mod config;

use std::sync::Arc;

use signet_core::{
    DefaultKeyGenerator, DefaultSignerFactory, DeviceOperations, DeviceService,
    InMemoryDeviceRepository, InMemoryKeyStore, InMemorySignatureStore, LoggedDeviceService,
};
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::Config::from_env();
    let app = api::router(build_service());

    let listener = tokio::net::TcpListener::bind(&config.listen_address)
        .await
        .expect("bind listen address");
    info!(address = %config.listen_address, "signet-server listening");
    axum::serve(listener, app).await.expect("serve http");
}

fn build_service() -> Arc<dyn DeviceOperations> {
    let service = DeviceService::new(
        Arc::new(InMemoryDeviceRepository::new()),
        Arc::new(InMemoryKeyStore::new()),
        Arc::new(DefaultKeyGenerator::new()),
        Arc::new(DefaultSignerFactory::new()),
        Arc::new(InMemorySignatureStore::new()),
    );
    Arc::new(LoggedDeviceService::new(service))
}
