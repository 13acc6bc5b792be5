use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all POS endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/sessions/:session_id/done-orders",
            get(handler::search_done_orders_handler),
        )
        .route("/v1/orders/:order_id", get(handler::load_done_order_handler))
        .route(
            "/v1/orders/:order_id/refund",
            post(handler::create_refund_order_handler),
        )
        .route(
            "/v1/orders/:order_id/refunds",
            get(handler::list_refund_orders_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
