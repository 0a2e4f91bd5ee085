use crate::lib::environment::Environment;
use crate::lib::error::FabgateResult;
use crate::server::{router, AppState};
use anyhow::Context;
use clap::Parser;
use slog::info;
use std::net::SocketAddr;
use std::sync::Arc;

/// Serves the transactions HTTP API.
#[derive(Parser)]
pub struct ServeOpts {
    /// The address to listen on, overriding the configuration.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

pub async fn exec(env: &Environment, opts: ServeOpts) -> FabgateResult {
    let log = env.get_logger().clone();
    let wallet = env.get_wallet()?;
    let state = AppState {
        lifecycle: Arc::new(env.new_lifecycle_manager(wallet.clone())?),
        session: Arc::new(env.new_ledger_session(wallet)?),
        log: log.clone(),
    };

    let bind = opts.bind.unwrap_or(env.get_config().server.bind);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}.", bind))?;
    info!(log, "Listening on http://{}", bind);

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(async {
            // An error here means no signal handler could be installed; run until killed.
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await?;
    info!(log, "Server stopped");
    Ok(())
}
