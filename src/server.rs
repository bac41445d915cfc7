//! HTTP server lifecycle: open the database, bind, serve until a shutdown
//! signal arrives.

use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::db::{Database, DbError};
use crate::router::create_router;
use crate::state::AppState;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("failed to open database: {0}")]
    Database(#[from] DbError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the site with `config` until Ctrl+C or SIGTERM.
pub async fn serve(config: AppConfig) -> Result<(), ServeError> {
    let db = Database::open(Path::new(&config.database.path))?;
    info!(path = %config.database.path, "database ready");

    let addr = config.server.bind.clone();
    let state = AppState::new(config, db);
    let app = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
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
    info!("Shutting down gracefully...");
}
