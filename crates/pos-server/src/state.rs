use std::path::PathBuf;
use std::sync::Arc;

use pos_ledger::PosService;
use pos_store::InMemoryPosStore;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ServerError, ServerResult};

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: Arc<PosService<InMemoryPosStore>>,
    /// Where committed refunds are written back, if anywhere.
    pub persist_to: Option<PathBuf>,
    /// Held from snapshot to rename so saves land in snapshot order.
    save_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(service: PosService<InMemoryPosStore>) -> Self {
        Self {
            service: Arc::new(service),
            persist_to: None,
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn persisting_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_to = Some(path.into());
        self
    }

    /// Save the current store to `persist_to`.
    ///
    /// The snapshot is taken after the lock is acquired, so the last save on
    /// disk always holds every commit made before it started.
    pub async fn persist(&self) -> ServerResult<()> {
        let Some(path) = self.persist_to.clone() else {
            return Ok(());
        };
        let _guard = self.save_lock.lock().await;
        let snapshot = self.service.store().snapshot()?;
        let orders = snapshot.orders.len();
        let saved = path.clone();
        tokio::task::spawn_blocking(move || snapshot.save(&saved))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))??;
        debug!(path = %path.display(), orders, "store persisted");
        Ok(())
    }
}
