use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use pos_types::{Order, OrderLine, Partner, PosConfig, PosSession, Product};

use crate::error::{StoreError, StoreResult};

/// Serializable image of a store: every record, no indexes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub partners: Vec<Partner>,
    #[serde(default)]
    pub configs: Vec<PosConfig>,
    #[serde(default)]
    pub sessions: Vec<PosSession>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
}

impl StoreSnapshot {
    /// Read a JSON snapshot from disk.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let bytes = fs::read(path)?;
        let snapshot: Self = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        debug!(
            path = %path.display(),
            orders = snapshot.orders.len(),
            lines = snapshot.lines.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Write the snapshot as pretty-printed JSON, replacing the file.
    ///
    /// The JSON goes to a temporary file in the same directory, which is then
    /// renamed over `path`. Readers see the old file or the new one, never a
    /// partial write.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&json)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| e.error)?;
        debug!(path = %path.display(), orders = self.orders.len(), "saved snapshot");
        Ok(())
    }
}
