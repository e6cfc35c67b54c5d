//! API Server

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::{
    config::GrindConfig,
    store::{InMemorySessionStore, SessionStore},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// Router with the full middleware stack
pub fn create_app(state: Arc<AppState>, allowed_origins: Vec<String>, request_timeout_secs: u64) -> axum::Router {
    create_router(state)
        // Innermost, so handlers always find the request id extension
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(create_cors_layer(allowed_origins))
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
}

pub struct ApiServer {
    config: GrindConfig,
    store: Arc<dyn SessionStore>,
}

impl ApiServer {
    /// Server backed by the in-memory store sized from the configuration
    pub fn new(config: GrindConfig) -> Self {
        let store: Arc<dyn SessionStore> = match config.server.max_sessions {
            Some(max) => Arc::new(InMemorySessionStore::with_capacity_limit(max)),
            None => Arc::new(InMemorySessionStore::new()),
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: GrindConfig, store: Arc<dyn SessionStore>) -> Self {
        Self { config, store }
    }

    pub fn app(&self) -> axum::Router {
        let state = Arc::new(AppState {
            store: self.store.clone(),
            policy: self.config.session.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        });
        create_app(
            state,
            self.config.server.allowed_origins.clone(),
            self.config.server.request_timeout_secs,
        )
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.app();
        let addr = self.socket_addr()?;

        self.log_server_info(&addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API server stopped");
        Ok(())
    }

    fn socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.server.host.parse::<std::net::IpAddr>()?,
            self.config.server.port,
        )))
    }

    fn log_server_info(&self, addr: &SocketAddr) {
        let policy = &self.config.session;
        info!("Oscar's Grind tracker listening on http://{}", addr);
        info!("   CORS: {:?}", self.config.server.allowed_origins);
        info!("   Request timeout: {}s", self.config.server.request_timeout_secs);
        info!("   Enforce bankroll limit: {}", policy.enforce_bankroll_limit);
        match policy.max_history {
            Some(max) => info!("   History retention: last {} rounds", max),
            None => info!("   History retention: full"),
        }
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
