use serde::{Deserialize, Serialize};

use crate::ids::{LineId, OrderId, ProductId};

/// A line of a point-of-sale order.
///
/// Quantities are signed: positive for a sale, negative for a refund. A line
/// is a refund line iff `returned_line` is set; the link is fixed at creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: LineId,
    pub order: OrderId,
    pub product: ProductId,
    pub qty: i64,
    pub price_unit: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub returned_line: Option<LineId>,
}

impl OrderLine {
    /// Returns `true` if this line refunds another line.
    pub fn is_refund(&self) -> bool {
        self.returned_line.is_some()
    }

    /// Untaxed amount of the line after discount.
    pub fn subtotal(&self) -> f64 {
        self.qty as f64 * self.price_unit * (1.0 - self.discount / 100.0)
    }

    /// A new line on `order` mirroring this line's descriptive fields
    /// (product, price, discount) and refunding it with `qty`.
    pub fn refund_draft(&self, order: OrderId, qty: i64) -> LineDraft {
        LineDraft {
            order,
            product: self.product,
            qty,
            price_unit: self.price_unit,
            discount: self.discount,
            returned_line: Some(self.id),
        }
    }

    /// The line's fields without its identity.
    pub fn to_draft(&self) -> LineDraft {
        LineDraft {
            order: self.order,
            product: self.product,
            qty: self.qty,
            price_unit: self.price_unit,
            discount: self.discount,
            returned_line: self.returned_line,
        }
    }
}

/// A line that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineDraft {
    pub order: OrderId,
    pub product: ProductId,
    pub qty: i64,
    pub price_unit: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub returned_line: Option<LineId>,
}

impl LineDraft {
    /// A plain sale line without discount.
    pub fn sale(order: OrderId, product: ProductId, qty: i64, price_unit: f64) -> Self {
        Self {
            order,
            product,
            qty,
            price_unit,
            discount: 0.0,
            returned_line: None,
        }
    }

    pub fn into_line(self, id: LineId) -> OrderLine {
        OrderLine {
            id,
            order: self.order,
            product: self.product,
            qty: self.qty,
            price_unit: self.price_unit,
            discount: self.discount,
            returned_line: self.returned_line,
        }
    }
}

/// Editable fields of a stored line. Links are not editable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineUpdate {
    #[serde(default)]
    pub qty: Option<i64>,
    #[serde(default)]
    pub price_unit: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
}

impl LineUpdate {
    pub fn qty(qty: i64) -> Self {
        Self {
            qty: Some(qty),
            ..Default::default()
        }
    }

    /// Apply the set fields to `line`.
    pub fn apply_to(&self, line: &mut OrderLine) {
        if let Some(qty) = self.qty {
            line.qty = qty;
        }
        if let Some(price_unit) = self.price_unit {
            line.price_unit = price_unit;
        }
        if let Some(discount) = self.discount {
            line.discount = discount;
        }
    }
}
