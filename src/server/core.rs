use log::{error, info};
use tokio::net::TcpListener;

use crate::error::ServerError;
use crate::server::state::AppState;
use crate::web::build_router;

pub struct Server {
    listener: TcpListener,
    state: AppState,
    addr: String,
}

impl Server {
    /// Binds the HTTP listener.
    pub async fn bind(addr: &str, state: AppState) -> Result<Self, ServerError> {
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => {
                info!("Server bound to {}", addr);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", addr, e);
                return Err(ServerError::Bind {
                    addr: addr.to_string(),
                    source: e,
                });
            }
        };

        Ok(Self {
            listener,
            state,
            addr: addr.to_string(),
        })
    }

    /// Serves requests until Ctrl-C / SIGTERM.
    pub async fn start(self) -> Result<(), ServerError> {
        info!(
            "Serving {} on http://{}",
            self.state.root().path().display(),
            self.addr
        );

        let app = build_router(self.state);
        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}
