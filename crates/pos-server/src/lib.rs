//! HTTP server for the POS returns ledger.
//!
//! Exposes done-order search, order loading, refund order creation and
//! refund order listing over JSON, backed by one shared in-memory store.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorBody, ServerError, ServerResult};
pub use server::PosServer;
pub use state::AppState;
