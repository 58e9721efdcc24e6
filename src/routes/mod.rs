pub mod products;
pub mod users;
pub mod cart;
pub mod orders;

use axum::Router;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(products::routes())
        .merge(users::routes())
        .merge(cart::routes())
        .merge(orders::routes())
}
