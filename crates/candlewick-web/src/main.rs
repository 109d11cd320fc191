mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use candlewick_core::{ReqwestHttpClient, ServiceConfig};
use candlewick_web::{router, AppState, ServerError};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), ServerError> {
    // A missing .env file is not an error.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = ServiceConfig::from_env()?;
    tracing::info!(
        upstream = %config.upstream_base_url,
        timeout_ms = config.timeout_ms,
        timezone = config.market_timezone.name(),
        default_key = config.default_api_key.is_some(),
        "loaded configuration"
    );

    let state = AppState::from_config(Arc::new(ReqwestHttpClient::new()), &config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((cli.bind.as_str(), cli.port)).await?;
    tracing::info!("candlewick listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, stopping");
}
