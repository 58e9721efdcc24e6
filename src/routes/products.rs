use axum::{
    routing::{get, post},
    Router, middleware,
};
use crate::handlers::product::{
    list_products, get_product, create_product, category_products, subcategory_products,
    related_products,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let open = Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/products/category/{category}", get(category_products))
        .route("/products/category/{category}/{subcategory}", get(subcategory_products))
        .route("/products/related/{id}", get(related_products));

    let protected = Router::new()
        .route("/products", post(create_product))
        .layer(middleware::from_fn(require_auth));

    open.merge(protected)
}
