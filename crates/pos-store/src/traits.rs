use pos_types::{
    ConfigId, LineDraft, LineId, LineUpdate, Order, OrderDraft, OrderId, OrderLine, Partner,
    PartnerId, PosConfig, PosSession, Product, ProductId, SessionId,
};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Read boundary over orders, lines and their reference data.
///
/// Reverse collections (`refund_lines`, `refund_orders`) are derived from the
/// forward links and must always agree with them.
pub trait PosReader {
    fn order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    fn line(&self, id: LineId) -> StoreResult<Option<OrderLine>>;

    /// Lines of an order, in creation order.
    fn order_lines(&self, order: OrderId) -> StoreResult<Vec<OrderLine>>;

    /// Lines whose `returned_line` is `line`.
    fn refund_lines(&self, line: LineId) -> StoreResult<Vec<OrderLine>>;

    /// Orders whose `returned_order` is `order`, in creation order.
    fn refund_orders(&self, order: OrderId) -> StoreResult<Vec<OrderId>>;

    /// All orders, in creation order.
    fn orders(&self) -> StoreResult<Vec<Order>>;

    fn product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    fn partner(&self, id: PartnerId) -> StoreResult<Option<Partner>>;

    fn session(&self, id: SessionId) -> StoreResult<Option<PosSession>>;

    fn config(&self, id: ConfigId) -> StoreResult<Option<PosConfig>>;

    /// Like [`Self::order`] but a missing order is an error.
    fn require_order(&self, id: OrderId) -> StoreResult<Order> {
        self.order(id)?.ok_or(StoreError::OrderNotFound(id))
    }

    fn require_line(&self, id: LineId) -> StoreResult<OrderLine> {
        self.line(id)?.ok_or(StoreError::LineNotFound(id))
    }

    fn require_product(&self, id: ProductId) -> StoreResult<Product> {
        self.product(id)?.ok_or(StoreError::ProductNotFound(id))
    }

    fn require_session(&self, id: SessionId) -> StoreResult<PosSession> {
        self.session(id)?.ok_or(StoreError::SessionNotFound(id))
    }

    fn require_config(&self, id: ConfigId) -> StoreResult<PosConfig> {
        self.config(id)?.ok_or(StoreError::ConfigNotFound(id))
    }
}

/// Write boundary. Callers reach it only inside [`PosStore::transaction`].
pub trait PosWriter: PosReader {
    fn insert_order(&mut self, draft: OrderDraft) -> StoreResult<OrderId>;

    /// Insert a line. The order, product and `returned_line` must exist.
    fn insert_line(&mut self, draft: LineDraft) -> StoreResult<LineId>;

    /// Edit quantity, price or discount. Links are not editable.
    fn update_line(&mut self, id: LineId, update: &LineUpdate) -> StoreResult<()>;

    /// Link `order` as a refund of `returned`. Fails if already linked.
    fn set_returned_order(&mut self, order: OrderId, returned: OrderId) -> StoreResult<()>;

    fn set_amount_total(&mut self, order: OrderId, amount_total: f64) -> StoreResult<()>;

    /// Delete lines. Fails, deleting nothing, if any of them is referenced
    /// by a refund line outside the set.
    fn delete_lines(&mut self, ids: &[LineId]) -> StoreResult<()>;
}

/// Result of duplicating an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duplication {
    pub order: OrderId,
    pub name: String,
    pub lines: Vec<LineId>,
}

/// Deep-copy capability for orders.
///
/// The copy is a fresh draft order with verbatim copies of every line.
pub trait OrderDuplicator {
    fn duplicate_order(&mut self, order: OrderId) -> StoreResult<Duplication>;
}

/// A store that runs reads and all-or-nothing write transactions.
///
/// Implementations serialize transactions so that a read-validate-write
/// sequence against a line cannot interleave with another one.
pub trait PosStore: Send + Sync {
    type Tx: PosWriter + OrderDuplicator;

    /// Run `f` against a consistent read view.
    fn view<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Self::Tx) -> Result<T, E>;

    /// Run `f` against a writable working copy, committing its writes only
    /// if it returns `Ok`.
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Self::Tx) -> Result<T, E>;
}
