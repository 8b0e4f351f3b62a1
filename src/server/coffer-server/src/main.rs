//! Coffer Server - Main entry point.

mod config;
mod shutdown;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use coffer_api::AppState;
use coffer_auth::StartupAuthenticator;
use coffer_gateway::{CredentialGateway, PassCli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let addr = cli.bind_addr()?;
    let mode = cli.run_mode();

    tracing::info!("Starting Coffer server...");
    tracing::info!("Bind address: {}", addr);

    if mode.is_test() {
        tracing::warn!("Test mode enabled - secrets are fixtures, DO NOT USE IN PRODUCTION");
    }

    let pass_cli = Arc::new(
        PassCli::new(&cli.pass_cli, cli.lookup_timeout())
            .with_not_found_exit_code(cli.pass_cli_not_found_code),
    );

    // Login must complete before the listener exists.
    let mut authenticator = StartupAuthenticator::new(pass_cli.clone(), cli.identity.clone(), mode);
    if let Err(e) = authenticator.authenticate().await {
        tracing::error!(error = %e, "Startup authentication failed, refusing to serve");
        return Err(e.into());
    }

    let gateway = CredentialGateway::new(pass_cli, mode);
    let state = Arc::new(AppState::new(gateway, &cli.bundle));
    let app = coffer_api::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(bundle = %cli.bundle.display(), "Coffer server listening on {}", addr);

    coffer_api::serve(listener, app, shutdown::wait_for(tokio::signal::ctrl_c())).await?;

    Ok(())
}
