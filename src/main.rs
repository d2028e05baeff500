use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use vethere_core::config::{
    data_dir_from_env_value, max_status_attempts_from_env_value, store_backend_from_env_value,
};
use vethere_core::{ClinicServices, CoreConfig};

/// Main entry point for the VetHere server
///
/// Serves the REST API (with Swagger UI at `/swagger-ui`).
///
/// # Environment Variables
/// - `VETHERE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `VETHERE_DATA_DIR`: Data directory for the file store (default: "vethere_data")
/// - `VETHERE_STORE`: `memory` or `file` (default: `file`)
/// - `VETHERE_MAX_STATUS_ATTEMPTS`: Status-change retry bound (default: 8)
/// - `API_TOKEN`: Bearer token required on every API route (required)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vethere_run=info".parse()?)
                .add_directive("vethere_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("VETHERE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let api_token = match std::env::var("API_TOKEN") {
        Ok(token) if !token.trim().is_empty() => token.trim().to_string(),
        _ => anyhow::bail!("API_TOKEN must be set to a non-empty value"),
    };

    let cfg = CoreConfig::new(
        data_dir_from_env_value(std::env::var("VETHERE_DATA_DIR").ok()),
        store_backend_from_env_value(std::env::var("VETHERE_STORE").ok())?,
        max_status_attempts_from_env_value(std::env::var("VETHERE_MAX_STATUS_ATTEMPTS").ok())?,
    )?;
    let services = ClinicServices::open(&cfg)?;

    tracing::info!("++ Starting VetHere REST on {}", rest_addr);

    let app = router(AppState::new(services, api_token));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
