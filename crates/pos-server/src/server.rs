use pos_ledger::PosService;
use pos_store::{InMemoryPosStore, StoreSnapshot};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// POS returns server over one in-memory store.
pub struct PosServer {
    config: ServerConfig,
    state: AppState,
}

impl PosServer {
    pub fn new(config: ServerConfig, store: InMemoryPosStore) -> Self {
        let mut state = AppState::new(PosService::new(store));
        if config.persist {
            state = state.persisting_to(config.data_path.clone());
        }
        Self { config, state }
    }

    /// Load the store from `config.data_path`. A missing file starts empty.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let store = if config.data_path.exists() {
            InMemoryPosStore::from_snapshot(StoreSnapshot::load(&config.data_path)?)?
        } else {
            tracing::warn!(path = %config.data_path.display(), "data file missing, starting empty");
            InMemoryPosStore::default()
        };
        let server = Self::new(config, store);
        let violations = server.state.service.audit()?;
        if !violations.is_empty() {
            tracing::warn!(
                path = %server.config.data_path.display(),
                violations = violations.len(),
                "data file holds lines that break the return rules"
            );
        }
        Ok(server)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = build_router(self.state);
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("POS server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
