//! Returnable-quantity ledger for point-of-sale orders.
//!
//! This crate holds the business rules of returns. It provides:
//! - Returnable-quantity accounting over sale lines and their refund lines
//! - `ReturnValidator`, run on every created or edited line
//! - `LineWriter` for validated, all-or-nothing line batches
//! - `RefundOrchestrator`, building the return order of a sale
//! - `OrderProjection`, the read models used by tills (search, order detail)
//! - `PosService`, wiring all of the above to a `pos_store::PosStore`

pub mod error;
pub mod projection;
pub mod quantity;
pub mod refund;
pub mod service;
pub mod validation;
pub mod writer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{LedgerError, LedgerResult, ReturnViolation, ViolationKind};
pub use projection::{
    DoneOrderDetail, DoneOrderSummary, LineProjection, OrderProjection, PartnerRef,
    PaymentProjection, RefundOrders,
};
pub use quantity::{max_returnable_quantity, returnable_quantity, LineLedger};
pub use refund::RefundOrchestrator;
pub use service::PosService;
pub use validation::{ReturnValidator, WriteOptions};
pub use writer::{LineWrite, LineWriter};
