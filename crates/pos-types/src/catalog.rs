use serde::{Deserialize, Serialize};

use crate::ids::{PartnerId, ProductId};

/// Product metadata needed by return validation and messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Display name of the unit of measure, e.g. `Units` or `kg`.
    pub uom: String,
    /// Whether a bare negative quantity may be sold outside the return flow.
    #[serde(default)]
    pub allow_negative_qty: bool,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            uom: "Units".into(),
            allow_negative_qty: false,
        }
    }

    pub fn allowing_negative_qty(mut self) -> Self {
        self.allow_negative_qty = true;
        self
    }
}

/// A customer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    pub display_name: String,
}
