use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use pos_ledger::LedgerError;
use pos_store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// JSON body of every error response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Ledger(LedgerError::Violation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Ledger(LedgerError::Store(e)) | Self::Store(e) if e.is_not_found() => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ledger(LedgerError::Violation(v)) => v.kind.as_str(),
            Self::Ledger(LedgerError::Store(e)) | Self::Store(e) if e.is_not_found() => {
                "not_found"
            }
            Self::Ledger(LedgerError::Store(_)) | Self::Store(_) => "store_error",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pos_ledger::{ReturnViolation, ViolationKind};
    use pos_types::{LineId, OrderId};

    use super::*;

    #[test]
    fn violations_are_unprocessable() {
        let err = ServerError::from(LedgerError::from(ReturnViolation {
            line: LineId::new(3),
            kind: ViolationKind::ExceedsRemainingReturnable,
            quantity: 4,
            ceiling: Some(1),
            product: "Apple".into(),
            uom: "Units".into(),
        }));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.kind(), "exceeds_remaining_returnable");
    }

    #[test]
    fn missing_records_are_not_found() {
        let err = ServerError::from(LedgerError::from(StoreError::OrderNotFound(OrderId::new(7))));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn store_failures_are_internal() {
        let err = ServerError::from(StoreError::LockPoisoned);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "store_error");
    }
}
