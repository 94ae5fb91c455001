mod seed;

use std::sync::Arc;

use api::{router, AppState};
use auth::{HashCost, SessionService, TokenIssuer, UserStore};
use storage::{FileUserStore, InMemoryUserStore};
use tokio::net::TcpListener;
use userdir_core::{telemetry, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let (config, overrides) = match AppConfig::load_with_env() {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };
    for key in &overrides {
        tracing::info!(key = %key, "configuration overridden from environment");
    }

    let store: Arc<dyn UserStore> = match &config.storage.path {
        Some(path) => {
            tracing::info!(path = %path.display(), "using file-backed user store");
            Arc::new(FileUserStore::open(path).await?)
        }
        None => {
            tracing::warn!("no storage.path configured; users live in memory only");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_expiry_seconds)?;
    tracing::info!(ttl_seconds = tokens.expires_in_seconds(), "token issuer ready");
    let cost = HashCost::new(
        config.auth.hash_memory_kib,
        config.auth.hash_iterations,
        config.auth.hash_parallelism,
    );
    let sessions = SessionService::new(store, tokens, cost)?;

    if let Some(seed) = &config.seed {
        seed::seed_admin(&sessions, seed).await?;
    }

    let app = router::router(Arc::new(AppState::new(sessions)));
    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
