use axum::{Router, routing::{get, post}, middleware};
use crate::handlers::cart::{add_to_cart, view_cart};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart/add", post(add_to_cart))
        .route("/cart", get(view_cart))
        .layer(middleware::from_fn(require_auth))
}
