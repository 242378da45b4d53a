//! Catalyst NGD wrapper HTTP service.
//!
//! Serves every wrapper route from one container, suitable for plain HTTP
//! hosting or as a serverless custom handler. The pipeline and downstream
//! bindings are built once at startup.
//!
//! # Configuration
//!
//! - `CATALYST_NGD_BASE_URL` - base URL of the downstream NGD wrapper (required)
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `RUST_LOG` - log level (default: info)
//! - `LOG_FORMAT` - log format: json (default) or text

mod adapter;
mod handlers;
mod health;
mod logging;

use std::env;
use std::net::SocketAddr;

use tracing::{error, info};

use catalyst_ngd_api::NgdApiClient;
use catalyst_ngd_core::{Pipeline, SchemaRegistry};

use crate::handlers::{router, AppState};
use crate::logging::{init_logging, LoggingConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env();
    init_logging(&logging_config);

    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    // The blocking HTTP client must be created and used off the async runtime.
    let client = tokio::task::spawn_blocking(NgdApiClient::from_env)
        .await?
        .map_err(|e| {
            error!(error = %e, "failed to configure NGD wrapper bindings");
            e
        })?;
    info!(
        base_url = client.base_url(),
        port = port,
        "starting catalyst-ngd-service"
    );

    let state = AppState::new(Pipeline::new(SchemaRegistry::new(), client.bindings()));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
