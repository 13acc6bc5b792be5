//! Foundation types for the POS returns ledger.
//!
//! This crate provides the identifiers and plain records shared by every
//! other crate of the workspace. It holds no behaviour beyond small helpers:
//! the returnable-quantity rules live in `pos-ledger`.
//!
//! # Key Types
//!
//! - [`Order`] / [`OrderDraft`] -- order header, optionally refunding another order
//! - [`OrderLine`] / [`LineDraft`] / [`LineUpdate`] -- signed-quantity lines and their edits
//! - [`Product`] -- unit of measure and the negative-quantity permission
//! - [`PosConfig`] / [`PosSession`] -- till configuration and cashier sessions

pub mod catalog;
pub mod error;
pub mod ids;
pub mod line;
pub mod order;
pub mod session;

pub use catalog::{Partner, Product};
pub use error::TypeError;
pub use ids::{
    ConfigId, FiscalPositionId, InvoiceId, JournalId, LineId, OrderId, PartnerId, ProductId,
    SessionId,
};
pub use line::{LineDraft, LineUpdate, OrderLine};
pub use order::{Order, OrderDraft, OrderState, PaymentEntry};
pub use session::{PosConfig, PosSession};
