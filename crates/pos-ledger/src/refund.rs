use std::collections::HashSet;

use pos_store::{Duplication, OrderDuplicator, PosWriter};
use pos_types::{LineId, OrderId, OrderLine};
use tracing::info;

use crate::error::LedgerResult;
use crate::quantity::max_returnable_quantity;
use crate::validation::WriteOptions;
use crate::writer::{LineWrite, LineWriter};

/// Builds return orders.
pub struct RefundOrchestrator;

impl RefundOrchestrator {
    /// Create the return order of `order`.
    ///
    /// The order is duplicated, linked back to `order`, emptied of its copied
    /// lines, and refilled with one negated line per original line that
    /// still has a returnable quantity. Lines already fully refunded get no
    /// refund line. The seeded lines go through the return rules with the
    /// refund-seeding override.
    ///
    /// Must run inside one store transaction: an error leaves the duplicate
    /// half-built, and only the rollback hides it.
    pub fn create_refund_order<W>(tx: &mut W, order: OrderId) -> LedgerResult<Duplication>
    where
        W: PosWriter + OrderDuplicator + ?Sized,
    {
        let duplication = tx.duplicate_order(order)?;
        let refund_order = duplication.order;
        tx.set_returned_order(refund_order, order)?;

        let copied: Vec<LineId> = tx
            .order_lines(refund_order)?
            .iter()
            .map(|line| line.id)
            .collect();
        tx.delete_lines(&copied)?;

        let mut writes = Vec::new();
        let nothing_excluded = HashSet::new();
        for line in tx.order_lines(order)? {
            let refunds = tx.refund_lines(line.id)?;
            let qty = max_returnable_quantity(&line, &refunds, &nothing_excluded).saturating_neg();
            if qty != 0 {
                writes.push(LineWrite::Create(line.refund_draft(refund_order, qty)));
            }
        }
        let seeded = LineWriter::write_batch(tx, writes, WriteOptions::refund_seeding())?;

        let amount_total = tx
            .order_lines(refund_order)?
            .iter()
            .map(OrderLine::subtotal)
            .sum();
        tx.set_amount_total(refund_order, amount_total)?;

        info!(
            order = %order,
            refund_order = %refund_order,
            lines = seeded.len(),
            amount_total,
            "created refund order"
        );
        Ok(duplication)
    }
}
