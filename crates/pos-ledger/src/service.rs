use pos_store::{Duplication, PosStore};
use pos_types::{LineId, OrderId, SessionId};

use crate::error::{LedgerResult, ReturnViolation};
use crate::projection::{DoneOrderDetail, DoneOrderSummary, OrderProjection, RefundOrders};
use crate::quantity::LineLedger;
use crate::refund::RefundOrchestrator;
use crate::validation::{ReturnValidator, WriteOptions};
use crate::writer::{LineWrite, LineWriter};

/// Entry points used by the till and by the HTTP layer.
///
/// Reads run against a store view; every write runs in one store
/// transaction, so a failed refund or batch leaves nothing behind.
#[derive(Debug)]
pub struct PosService<S> {
    store: S,
}

impl<S: PosStore> PosService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn search_done_orders_for_pos(
        &self,
        query: &str,
        session: SessionId,
    ) -> LedgerResult<Vec<DoneOrderSummary>> {
        self.store
            .view(|r| OrderProjection::search_done_orders(r, query, session))
    }

    pub fn load_done_order_for_pos(&self, order: OrderId) -> LedgerResult<DoneOrderDetail> {
        self.store
            .view(|r| OrderProjection::summary_for_order(r, order))
    }

    pub fn create_refund_order(&self, order: OrderId) -> LedgerResult<Duplication> {
        self.store
            .transaction(|tx| RefundOrchestrator::create_refund_order(tx, order))
    }

    pub fn list_refund_orders(&self, order: OrderId) -> LedgerResult<RefundOrders> {
        self.store
            .view(|r| OrderProjection::list_refund_orders(r, order))
    }

    pub fn is_returnable(&self, order: OrderId) -> LedgerResult<bool> {
        self.store.view(|r| OrderProjection::is_returnable(r, order))
    }

    pub fn returnable_quantity(&self, line: LineId) -> LedgerResult<i64> {
        self.store
            .view(|r| LineLedger::returnable_quantity(r, line))
    }

    /// Return-rule violations already present in the store.
    pub fn audit(&self) -> LedgerResult<Vec<ReturnViolation>> {
        self.store.view(|r| ReturnValidator::audit(r))
    }

    /// Create or edit lines on behalf of a user. The negative-quantity
    /// override is never available here.
    pub fn write_lines(&self, writes: Vec<LineWrite>) -> LedgerResult<Vec<LineId>> {
        self.store
            .transaction(|tx| LineWriter::write_batch(tx, writes, WriteOptions::default()))
    }
}
