//! Gateway server

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use super::router::{AppState, create_router};
use super::service::SmsGateway;
use crate::config::Config;
use crate::{Error, Result};

/// SMS gateway HTTP server
pub struct Gateway {
    /// Configuration
    config: Config,
    /// Gateway core
    core: Arc<SmsGateway>,
}

impl Gateway {
    /// Create a new gateway
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let core = Arc::new(SmsGateway::new(&config)?);
        Ok(Self { config, core })
    }

    /// Run the gateway until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let state = Arc::new(AppState {
            gateway: Arc::clone(&self.core),
        });
        let app = create_router(state);

        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("SMS GATEWAY v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(host = %self.config.server.host, port = %self.config.server.port, "Listening");
        info!(
            api_url = %self.config.provider.api_url,
            sender = %self.config.provider.sender,
            "Provider"
        );
        info!(
            limit = self.config.rate_limit.limit,
            window_secs = self.config.rate_limit.window.as_secs(),
            "Shared rate limit"
        );
        info!(
            "  GET http://{}:{}/send?telnr=..&message=..&action=sms",
            self.config.server.host, self.config.server.port
        );
        info!("============================================================");

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = shutdown_tx.send(true);
            })
            .into_future();
        tokio::pin!(server);

        let drain_timeout = self.config.server.shutdown_timeout;
        tokio::select! {
            result = &mut server => {
                result.map_err(|e| Error::Internal(e.to_string()))?;
            }
            () = async {
                if shutdown_rx.changed().await.is_ok() {
                    tokio::time::sleep(drain_timeout).await;
                } else {
                    std::future::pending::<()>().await;
                }
            } => {
                warn!(timeout_secs = drain_timeout.as_secs(), "Shutdown timeout elapsed, dropping open connections");
            }
        }

        let stats = self.core.stats();
        info!(
            delivered = stats.delivered,
            failed = stats.delivery_failed,
            rejected = stats.rejected,
            rate_limited = stats.rate_limited,
            "Gateway stopped"
        );
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
