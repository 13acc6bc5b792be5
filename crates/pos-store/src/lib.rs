//! Order and line persistence for the POS returns ledger.
//!
//! This crate is the persistence collaborator of the ledger: it stores
//! orders, lines and their reference data, and maintains the reverse-link
//! indexes (`refund_lines`, `refund_orders`) derived from the forward links
//! held by each record.
//!
//! # Contracts
//!
//! - [`PosReader`] / [`PosWriter`] -- record access; links are set on insert
//!   and never edited afterwards
//! - [`OrderDuplicator`] -- deep copy of an order and its lines
//! - [`PosStore`] -- read views and all-or-nothing write transactions
//!
//! # Backends
//!
//! - [`InMemoryPosStore`] -- `RwLock`-guarded [`PosState`], loadable from and
//!   savable to a JSON [`StoreSnapshot`]
//!
//! # Design Rules
//!
//! 1. Every write happens inside a transaction; a failed transaction leaves
//!    no partial writes visible.
//! 2. Transactions are serialized, so a read-then-write check against a line
//!    cannot race another writer.
//! 3. Store errors are infrastructure errors and are never used to report
//!    business-rule violations.

pub mod error;
pub mod memory;
pub mod snapshot;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryPosStore, PosState};
pub use snapshot::StoreSnapshot;
pub use traits::{Duplication, OrderDuplicator, PosReader, PosStore, PosWriter};
