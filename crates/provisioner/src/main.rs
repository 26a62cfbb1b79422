//! Provisioner service entrypoint
//!
//! A small, privilege-isolated HTTP service that configures reverse-proxy
//! routing and TLS for verified custom domains. It must only be reachable
//! from the control plane, never from the public internet.

mod executor;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use executor::{ExecError, ScriptExecutor};
use hostplane_shared::{ConfigureDomainRequest, RemoveDomainRequest};

fn error_response(err: ExecError) -> Response {
    let status = match err {
        ExecError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ExecError::Spawn(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn configure_custom_domain(
    State(executor): State<Arc<ScriptExecutor>>,
    Json(payload): Json<ConfigureDomainRequest>,
) -> Response {
    let args = executor.configure_args(&payload.custom_domain, &payload.email);
    match executor.run(args).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => error_response(err),
    }
}

async fn remove_custom_domain(
    State(executor): State<Arc<ScriptExecutor>>,
    Json(payload): Json<RemoveDomainRequest>,
) -> Response {
    let args = executor.remove_args(&payload.custom_domain);
    match executor.run(args).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => error_response(err),
    }
}

async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind_address =
        env::var("PROVISIONER_BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8100".to_string());
    let sudo_path = PathBuf::from(env::var("SUDO_PATH").unwrap_or_else(|_| "/usr/bin/sudo".to_string()));
    let scripts_dir = PathBuf::from(
        env::var("SCRIPTS_DIR").unwrap_or_else(|_| "/opt/hostplane/scripts".to_string()),
    );
    let timeout = Duration::from_secs(
        env::var("SCRIPT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "180".to_string())
            .parse()
            .unwrap_or(180),
    );
    let debug = env::var("DEBUG")
        .unwrap_or_else(|_| "false".to_string())
        .parse()
        .unwrap_or(false);

    let executor = Arc::new(ScriptExecutor::new(sudo_path, scripts_dir, timeout, debug));

    let router = Router::new()
        .route("/configure-custom-domain", post(configure_custom_domain))
        .route("/remove-custom-domain", post(remove_custom_domain))
        .route("/health/live", get(liveness))
        .with_state(executor);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    info!(%bind_address, "provisioner listening");

    axum::serve(listener, router)
        .await
        .context("Server error")?;

    Ok(())
}
