use std::fmt;

use pos_store::StoreError;
use pos_types::LineId;
use serde::Serialize;

/// Business rule broken by a line write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationKind {
    /// A refund asks for more than the original line sold.
    ExceedsOriginalQuantity,
    /// A refund asks for more than what earlier refunds left over.
    ExceedsRemainingReturnable,
    /// A negative original line outside the refund flow.
    UnauthorizedNegativeQuantity,
    /// A refund line targets another refund line.
    NestedRefund,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExceedsOriginalQuantity => "exceeds_original_quantity",
            Self::ExceedsRemainingReturnable => "exceeds_remaining_returnable",
            Self::UnauthorizedNegativeQuantity => "unauthorized_negative_quantity",
            Self::NestedRefund => "nested_refund",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-facing validation failure for one line.
///
/// `quantity` is the offending quantity as shown to the user: the returned
/// amount for refund rules, the raw negative quantity for bare lines.
/// `ceiling` is the computed limit where one applies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{}", self.message())]
pub struct ReturnViolation {
    pub line: LineId,
    pub kind: ViolationKind,
    pub quantity: i64,
    pub ceiling: Option<i64>,
    pub product: String,
    pub uom: String,
}

impl ReturnViolation {
    /// The message shown to the cashier.
    pub fn message(&self) -> String {
        let ceiling = self.ceiling.unwrap_or_default();
        match self.kind {
            ViolationKind::ExceedsOriginalQuantity => format!(
                "You can not return {} {} of {} because the original order line only mentions {} {}.",
                self.quantity, self.uom, self.product, ceiling, self.uom
            ),
            ViolationKind::ExceedsRemainingReturnable => format!(
                "You can not return {} {} of {} because some refunds have already been done. \
                 Maximum quantity allowed: {} {}.",
                self.quantity, self.uom, self.product, ceiling, self.uom
            ),
            ViolationKind::UnauthorizedNegativeQuantity => format!(
                "For legal and traceability reasons, you can not set a negative quantity \
                 ({} {} of {}) without using the return flow.",
                self.quantity, self.uom, self.product
            ),
            ViolationKind::NestedRefund => format!(
                "You can not return {} {} of {} because the targeted line is itself a refund.",
                self.quantity, self.uom, self.product
            ),
        }
    }
}

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A line broke a return rule; the whole write was discarded.
    #[error("{0}")]
    Violation(#[from] ReturnViolation),

    /// Persistence failure, passed through unchanged.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// The rule violation, if this is one.
    pub fn violation(&self) -> Option<&ReturnViolation> {
        match self {
            Self::Violation(v) => Some(v),
            Self::Store(_) => None,
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
