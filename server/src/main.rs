use std::process::ExitCode;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use hanbok_server::auth::TokenKeys;
use hanbok_server::config::{Config, StorageBackend};
use hanbok_server::db::{MemoryRepository, PgRepository, Repository};
use hanbok_server::handlers::users::ensure_superuser;
use hanbok_server::routes::{create_routes, RouterOptions};
use hanbok_server::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let repo: Arc<dyn Repository> = match config.storage {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or("DATABASE_URL must be set")?;
            let repo = PgRepository::connect(url, config.max_connections).await?;
            tracing::info!("Successfully connected to database");
            repo.migrate().await?;
            tracing::info!("Migrations run successfully");
            Arc::new(repo)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Arc::new(MemoryRepository::new())
        }
    };

    if let Some(seed) = &config.admin {
        ensure_superuser(repo.as_ref(), seed).await?;
    }

    let tokens = TokenKeys::new(
        &config.jwt_secret,
        config.access_token_ttl,
        config.refresh_token_ttl,
    );
    let app = create_routes(
        AppState::new(repo, tokens),
        RouterOptions {
            cors_allowed_origins: config.cors_allowed_origins.clone(),
            include_hsts: config.production,
        },
    );

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server running at http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
