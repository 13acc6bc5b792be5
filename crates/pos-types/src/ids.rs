use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw database identifier.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw numeric identifier.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            /// Accepts `42` as well as the prefixed form `order:42`.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s
                    .strip_prefix(concat!($prefix, ":"))
                    .unwrap_or(s)
                    .trim();
                digits
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| TypeError::InvalidId(s.to_string()))
            }
        }
    };
}

record_id!(
    /// Identifier of a point-of-sale order.
    OrderId,
    "order"
);
record_id!(
    /// Identifier of an order line.
    LineId,
    "line"
);
record_id!(
    /// Identifier of a sellable product.
    ProductId,
    "product"
);
record_id!(
    /// Identifier of a customer.
    PartnerId,
    "partner"
);
record_id!(
    /// Identifier of a cashier session.
    SessionId,
    "session"
);
record_id!(
    /// Identifier of a point-of-sale configuration (one per till).
    ConfigId,
    "config"
);
record_id!(
    /// Identifier of a payment journal.
    JournalId,
    "journal"
);
record_id!(FiscalPositionId, "fiscal");
record_id!(InvoiceId, "invoice");
