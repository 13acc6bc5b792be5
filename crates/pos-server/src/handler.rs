use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use pos_ledger::{DoneOrderDetail, DoneOrderSummary, RefundOrders};
use pos_store::{Duplication, PosReader, PosStore};
use pos_types::{OrderId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> ServerResult<Json<serde_json::Value>> {
    let orders = state
        .service
        .store()
        .view(|s| s.orders())
        .map_err(ServerError::Store)?
        .len();
    Ok(Json(json!({
        "name": "pos-server",
        "version": env!("CARGO_PKG_VERSION"),
        "orders": orders,
        "persist": state.persist_to.is_some(),
    })))
}

pub async fn search_done_orders_handler(
    State(state): State<AppState>,
    Path(session): Path<SessionId>,
    Query(params): Query<SearchParams>,
) -> ServerResult<Json<Vec<DoneOrderSummary>>> {
    let found = state
        .service
        .search_done_orders_for_pos(&params.query, session)?;
    Ok(Json(found))
}

pub async fn load_done_order_handler(
    State(state): State<AppState>,
    Path(order): Path<OrderId>,
) -> ServerResult<Json<DoneOrderDetail>> {
    Ok(Json(state.service.load_done_order_for_pos(order)?))
}

pub async fn create_refund_order_handler(
    State(state): State<AppState>,
    Path(order): Path<OrderId>,
) -> ServerResult<(StatusCode, Json<Duplication>)> {
    let duplication = state.service.create_refund_order(order)?;
    // The refund is committed in memory; a failed save must not report it
    // as failed. The next successful save writes it out.
    if let Err(err) = state.persist().await {
        error!(error = %err, refund_order = %duplication.order, "refund committed but not saved");
    }
    info!(order = %order, refund_order = %duplication.order, "refund order created over HTTP");
    Ok((StatusCode::CREATED, Json(duplication)))
}

pub async fn list_refund_orders_handler(
    State(state): State<AppState>,
    Path(order): Path<OrderId>,
) -> ServerResult<Json<RefundOrders>> {
    Ok(Json(state.service.list_refund_orders(order)?))
}
