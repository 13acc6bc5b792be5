use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{ConfigId, FiscalPositionId, InvoiceId, JournalId, OrderId, PartnerId, SessionId};

/// Lifecycle state of a point-of-sale order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Draft,
    Cancel,
    Paid,
    Done,
    Invoiced,
}

impl OrderState {
    /// States of a completed sale (the ones offered for returns).
    pub const COMPLETED: [OrderState; 3] = [Self::Paid, Self::Done, Self::Invoiced];

    /// Returns `true` for `paid`, `done` and `invoiced`.
    pub fn is_completed(&self) -> bool {
        Self::COMPLETED.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Cancel => "cancel",
            Self::Paid => "paid",
            Self::Done => "done",
            Self::Invoiced => "invoiced",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "cancel" => Ok(Self::Cancel),
            "paid" => Ok(Self::Paid),
            "done" => Ok(Self::Done),
            "invoiced" => Ok(Self::Invoiced),
            other => Err(TypeError::UnknownState(other.to_string())),
        }
    }
}

/// A payment registered against an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub journal: JournalId,
    pub amount: f64,
}

/// A point-of-sale order header.
///
/// Lines are stored as separate records and looked up through the store.
/// `returned_order` is the owned back-reference to the order this one
/// refunds; the forward collection of refund orders is derived from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub name: String,
    #[serde(default)]
    pub pos_reference: Option<String>,
    #[serde(default)]
    pub partner: Option<PartnerId>,
    pub date_order: DateTime<Utc>,
    pub state: OrderState,
    pub config: ConfigId,
    #[serde(default)]
    pub session: Option<SessionId>,
    #[serde(default)]
    pub fiscal_position: Option<FiscalPositionId>,
    #[serde(default)]
    pub invoice: Option<InvoiceId>,
    pub amount_total: f64,
    #[serde(default)]
    pub returned_order: Option<OrderId>,
    #[serde(default)]
    pub payments: Vec<PaymentEntry>,
}

impl Order {
    /// Returns `true` if this order refunds another one.
    pub fn is_refund(&self) -> bool {
        self.returned_order.is_some()
    }

    /// The header fields without the identity, e.g. to feed a copy.
    pub fn to_draft(&self) -> OrderDraft {
        OrderDraft {
            name: self.name.clone(),
            pos_reference: self.pos_reference.clone(),
            partner: self.partner,
            date_order: self.date_order,
            state: self.state,
            config: self.config,
            session: self.session,
            fiscal_position: self.fiscal_position,
            invoice: self.invoice,
            amount_total: self.amount_total,
            payments: self.payments.clone(),
        }
    }
}

/// Header of an order that has not been stored yet.
///
/// A draft can never carry `returned_order`: that link is only set by
/// refund orchestration on an already stored order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub name: String,
    #[serde(default)]
    pub pos_reference: Option<String>,
    #[serde(default)]
    pub partner: Option<PartnerId>,
    pub date_order: DateTime<Utc>,
    pub state: OrderState,
    pub config: ConfigId,
    #[serde(default)]
    pub session: Option<SessionId>,
    #[serde(default)]
    pub fiscal_position: Option<FiscalPositionId>,
    #[serde(default)]
    pub invoice: Option<InvoiceId>,
    pub amount_total: f64,
    #[serde(default)]
    pub payments: Vec<PaymentEntry>,
}

impl OrderDraft {
    /// A paid order with no customer, taken now at `config`.
    pub fn paid(name: impl Into<String>, config: ConfigId, amount_total: f64) -> Self {
        Self {
            name: name.into(),
            pos_reference: None,
            partner: None,
            date_order: Utc::now(),
            state: OrderState::Paid,
            config,
            session: None,
            fiscal_position: None,
            invoice: None,
            amount_total,
            payments: Vec::new(),
        }
    }

    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            name: self.name,
            pos_reference: self.pos_reference,
            partner: self.partner,
            date_order: self.date_order,
            state: self.state,
            config: self.config,
            session: self.session,
            fiscal_position: self.fiscal_position,
            invoice: self.invoice,
            amount_total: self.amount_total,
            returned_order: None,
            payments: self.payments,
        }
    }
}
