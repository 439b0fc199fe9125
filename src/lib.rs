// Public modules
pub mod bus;
pub mod clock;
pub mod config;
pub mod errors;
pub mod grpc_service;
pub mod registry;
pub mod sensors;
pub mod v4l2;

// Re-export commonly used types
pub use config::{load_bus_config, load_camera_config, BusConfig, CameraConfig};
pub use errors::{SensorError, SensorResult};
pub use grpc_service::{create_grpc_server, SubdevService};
pub use registry::init_all;

use crate::errors::ServiceError;
use std::net::SocketAddr;
use tonic::transport::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Initialize tracing with default configuration
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

fn listen_addr() -> Result<SocketAddr, ServiceError> {
    let host = std::env::var("GRPC_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("GRPC_PORT").unwrap_or_else(|_| "50051".to_string());
    let addr = format!("{}:{}", host, port);
    addr.parse().map_err(|e: std::net::AddrParseError| ServiceError::InvalidAddress {
        reason: e.to_string(),
        addr,
    })
}

/// Probe the configured cameras and serve them until ctrl-c
pub async fn run_subdev_host(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("[gc0308-subdev] starting up...");

    // Load configuration
    let bus_config = load_bus_config(&format!("{}/buses.toml", config_path))?;
    let camera_config = load_camera_config(&format!("{}/cameras.toml", config_path))?;
    info!(
        "[config] loaded {} bus(es) and {} camera(s)",
        bus_config.buses.len(),
        camera_config.cameras.len()
    );

    let addr = listen_addr()?;
    let service = SubdevService::new();
    info!("[gRPC] Service initialized");

    // a failed start-up has already released the cameras it brought up
    let registered = init_all(&bus_config, &camera_config, &service).await?;
    info!("[registry] registered subdevices: {:?}", registered);

    let server = create_grpc_server(service.clone());
    info!("[gRPC] Server starting on {}", addr);

    let result = Server::builder()
        .add_service(server)
        .serve_with_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("[main] cannot listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            info!("[main] shutting down");
        })
        .await;

    // power every sensor down even when the server failed
    service.shutdown().await;
    result.map_err(ServiceError::from)?;
    Ok(())
}
