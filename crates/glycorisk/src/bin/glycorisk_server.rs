//! HTTP server entry point.

use std::process::ExitCode;

use clap::Parser;
use glycorisk::config::Config;
use glycorisk::loader::ModelSlot;
use glycorisk::service::{http, PredictionService};
use glycorisk::{logging, schema};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    if let Err(err) = logging::init(config.log_format) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("server error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> std::io::Result<()> {
    let location = config.location();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        features = schema::N_FEATURES,
        "starting glycorisk-server"
    );
    tracing::info!(
        model_json = %location.model_json().display(),
        model_txt = %location.model_txt().display(),
        pipeline = %location.pipeline_json().display(),
        "artifact paths"
    );

    let slot = ModelSlot::new();
    let service = PredictionService::from_slot(&slot, location);
    if !service.state().is_loaded() {
        tracing::warn!("serving without a model; /predict will fail until restart");
    }

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, http::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
