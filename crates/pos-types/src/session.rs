use serde::{Deserialize, Serialize};

use crate::ids::{ConfigId, SessionId};

/// Point-of-sale configuration (a till).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosConfig {
    pub id: ConfigId,
    pub name: String,
    /// Maximum number of done orders returned by a search.
    #[serde(default = "PosConfig::default_max_done_orders")]
    pub max_done_orders: usize,
}

impl PosConfig {
    pub const DEFAULT_MAX_DONE_ORDERS: usize = 10;

    pub fn new(id: ConfigId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            max_done_orders: Self::DEFAULT_MAX_DONE_ORDERS,
        }
    }

    fn default_max_done_orders() -> usize {
        Self::DEFAULT_MAX_DONE_ORDERS
    }
}

/// A cashier session opened on a [`PosConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosSession {
    pub id: SessionId,
    pub config: ConfigId,
}
