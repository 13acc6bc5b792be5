use pos_types::{ConfigId, LineId, OrderId, PartnerId, ProductId, SessionId};

/// Errors from order/line persistence.
///
/// These are infrastructure failures. Business-rule violations never travel
/// through this type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("order line not found: {0}")]
    LineNotFound(LineId),

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("partner not found: {0}")]
    PartnerNotFound(PartnerId),

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("point of sale config not found: {0}")]
    ConfigNotFound(ConfigId),

    /// A line still referenced by refund lines cannot be deleted.
    #[error("order line {line} is referenced by {refunds} refund line(s)")]
    LineReferenced { line: LineId, refunds: usize },

    /// `returned_order` links are set once and never re-parented.
    #[error("order {0} is already linked to a returned order")]
    OrderAlreadyLinked(OrderId),

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// True when a referenced record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::OrderNotFound(_)
                | Self::LineNotFound(_)
                | Self::ProductNotFound(_)
                | Self::PartnerNotFound(_)
                | Self::SessionNotFound(_)
                | Self::ConfigNotFound(_)
        )
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
