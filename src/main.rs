//! chatbridge entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config (env overrides applied, token checked)
//!   3. Init logger at the configured level
//!   4. Build the inference provider and chat service
//!   5. Run the HTTP channel and the session sweeper until Ctrl-C

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use chatbridge::{
    config, logger,
    error::AppError,
    llm::providers,
    subsystems::{
        chat::ChatService,
        comms,
        memory::{SessionRegistry, SessionSweeper},
        runtime::{Component, run_components},
    },
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Optional file; a missing .env is not an error.
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level)?;

    info!(
        title = %config.title,
        provider = %config.llm.provider,
        model = %config.llm.model_name(),
        bind = %config.comms.http.bind,
        "config loaded"
    );

    let provider = providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| AppError::Llm(e.to_string()))?;

    let sessions = Arc::new(SessionRegistry::new());
    let chat = Arc::new(ChatService::from_config(&config, provider, sessions.clone()));

    let shutdown = CancellationToken::new();
    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {e}");
            return;
        }
        info!("ctrl-c received, shutting down");
        ctrl_c_token.cancel();
    });

    let mut components: Vec<Box<dyn Component>> = comms::channels(&config, chat);
    components.push(Box::new(SessionSweeper::new(
        sessions,
        Duration::from_secs(config.sessions.idle_ttl_seconds),
        Duration::from_secs(config.sessions.sweep_interval_seconds),
    )));

    run_components(components, shutdown).await?;
    info!("shutdown complete");
    Ok(())
}
