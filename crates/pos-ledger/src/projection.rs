use chrono::{DateTime, Utc};
use pos_store::PosReader;
use pos_types::{
    FiscalPositionId, JournalId, LineId, Order, OrderId, PartnerId, ProductId, SessionId,
};
use serde::{Deserialize, Serialize};

use crate::error::LedgerResult;
use crate::quantity::LineLedger;

/// Customer as shown in search results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerRef {
    pub id: PartnerId,
    pub display_name: String,
}

/// Row of the done-order search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoneOrderSummary {
    pub id: OrderId,
    pub name: String,
    pub pos_reference: Option<String>,
    pub partner: Option<PartnerRef>,
    pub date_order: DateTime<Utc>,
    pub amount_total: f64,
    pub is_returnable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineProjection {
    pub id: LineId,
    pub product_id: ProductId,
    pub qty: i64,
    pub qty_returnable: i64,
    pub price_unit: f64,
    pub discount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentProjection {
    pub journal_id: JournalId,
    pub amount: f64,
}

/// Flattened order loaded by a till to start a return.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoneOrderDetail {
    pub id: OrderId,
    pub date_order: DateTime<Utc>,
    pub pos_reference: Option<String>,
    pub name: String,
    pub partner_id: Option<PartnerId>,
    pub fiscal_position: Option<FiscalPositionId>,
    pub lines: Vec<LineProjection>,
    pub payments: Vec<PaymentProjection>,
    pub to_invoice: bool,
    pub returned_order_id: Option<OrderId>,
    /// `pos_reference` of the returned order.
    pub returned_order_reference: Option<String>,
}

/// Refund orders of an order: the order itself when there is exactly one,
/// otherwise their ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefundOrders {
    Single { order: DoneOrderDetail },
    Many { orders: Vec<OrderId> },
}

/// Read-only views over orders.
pub struct OrderProjection;

impl OrderProjection {
    /// An order is returnable when its total is not negative and some
    /// quantity is left on its lines.
    pub fn is_returnable<R: PosReader + ?Sized>(reader: &R, order: OrderId) -> LedgerResult<bool> {
        let order = reader.require_order(order)?;
        Self::order_is_returnable(reader, &order)
    }

    pub fn refund_order_count<R: PosReader + ?Sized>(
        reader: &R,
        order: OrderId,
    ) -> LedgerResult<usize> {
        reader.require_order(order)?;
        Ok(reader.refund_orders(order)?.len())
    }

    pub fn summary_for_order<R: PosReader + ?Sized>(
        reader: &R,
        order: OrderId,
    ) -> LedgerResult<DoneOrderDetail> {
        let order = reader.require_order(order)?;

        let mut lines = Vec::new();
        for line in reader.order_lines(order.id)? {
            lines.push(LineProjection {
                id: line.id,
                product_id: line.product,
                qty: line.qty,
                qty_returnable: LineLedger::returnable_quantity(reader, line.id)?,
                price_unit: line.price_unit,
                discount: line.discount,
            });
        }
        let payments = order
            .payments
            .iter()
            .map(|p| PaymentProjection {
                journal_id: p.journal,
                amount: p.amount,
            })
            .collect();
        let returned_order_reference = match order.returned_order {
            Some(returned) => reader.require_order(returned)?.pos_reference,
            None => None,
        };

        Ok(DoneOrderDetail {
            id: order.id,
            date_order: order.date_order,
            pos_reference: order.pos_reference,
            name: order.name,
            partner_id: order.partner,
            fiscal_position: order.fiscal_position,
            lines,
            payments,
            to_invoice: order.invoice.is_some(),
            returned_order_id: order.returned_order,
            returned_order_reference,
        })
    }

    /// Completed orders matching `query`, newest first.
    ///
    /// A blank query lists the orders of the session's point of sale. Any
    /// other query matches name, receipt reference or customer name,
    /// ignoring case, across every point of sale. Results are capped at the
    /// session config's `max_done_orders`.
    pub fn search_done_orders<R: PosReader + ?Sized>(
        reader: &R,
        query: &str,
        session: SessionId,
    ) -> LedgerResult<Vec<DoneOrderSummary>> {
        let session = reader.require_session(session)?;
        let config = reader.require_config(session.config)?;
        let needle = query.trim().to_lowercase();

        let mut orders = reader.orders()?;
        orders.sort_by(|a, b| b.id.cmp(&a.id));

        let mut results = Vec::new();
        for order in orders {
            if results.len() >= config.max_done_orders {
                break;
            }
            if !order.state.is_completed() {
                continue;
            }
            let partner = match order.partner {
                Some(id) => reader.partner(id)?.map(|p| PartnerRef {
                    id: p.id,
                    display_name: p.display_name,
                }),
                None => None,
            };
            let matched = if needle.is_empty() {
                order.config == config.id
            } else {
                contains_ignore_case(&order.name, &needle)
                    || order
                        .pos_reference
                        .as_deref()
                        .is_some_and(|r| contains_ignore_case(r, &needle))
                    || partner
                        .as_ref()
                        .is_some_and(|p| contains_ignore_case(&p.display_name, &needle))
            };
            if !matched {
                continue;
            }
            let is_returnable = Self::order_is_returnable(reader, &order)?;
            results.push(DoneOrderSummary {
                id: order.id,
                name: order.name,
                pos_reference: order.pos_reference,
                partner,
                date_order: order.date_order,
                amount_total: order.amount_total,
                is_returnable,
            });
        }
        Ok(results)
    }

    pub fn list_refund_orders<R: PosReader + ?Sized>(
        reader: &R,
        order: OrderId,
    ) -> LedgerResult<RefundOrders> {
        reader.require_order(order)?;
        let refunds = reader.refund_orders(order)?;
        match refunds.as_slice() {
            [only] => Ok(RefundOrders::Single {
                order: Self::summary_for_order(reader, *only)?,
            }),
            _ => Ok(RefundOrders::Many { orders: refunds }),
        }
    }

    fn order_is_returnable<R: PosReader + ?Sized>(reader: &R, order: &Order) -> LedgerResult<bool> {
        if order.amount_total < 0.0 {
            return Ok(false);
        }
        let mut open = 0;
        for line in reader.order_lines(order.id)? {
            open += LineLedger::returnable_quantity(reader, line.id)?;
        }
        Ok(open > 0)
    }
}

/// `needle` must already be lowercase.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
