use axum::{Router, routing::{get, post}, middleware};
use crate::handlers::order::{place_order, order_history};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders/place", post(place_order))
        .route("/orders/history", get(order_history))
        .layer(middleware::from_fn(require_auth))
}
