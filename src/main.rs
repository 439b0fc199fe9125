use gc0308_subdev::{init_tracing, run_subdev_host};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug for verbose, RUST_LOG=info for normal
    init_tracing();

    // Load configuration from CONFIG_PATH or default
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
    run_subdev_host(&config_path).await
}
