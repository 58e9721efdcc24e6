use axum::{extract::State, Extension, Json};
use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use crate::dtos::cart::{AddToCartRequest, CartItemResponse, CartResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::cart::CartLine;
use crate::state::AppState;

/// Cart rows joined with their products, oldest first. Prices come from the
/// current product rows, so totals always reflect today's prices.
pub async fn load_cart_lines(db_pool: &PgPool, user_id: i64) -> Result<Vec<CartLine>, AppError> {
    let lines = sqlx::query_as::<_, CartLine>(
        "SELECT p.serial_number, p.name, p.sku,
                p.price_with_shipping::FLOAT8 AS unit_price,
                p.sizes, ci.quantity
         FROM cart_items ci
         JOIN carts c ON ci.cart_id = c.id
         JOIN products p ON ci.product_id = p.serial_number
         WHERE c.user_id = $1
         ORDER BY ci.id",
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;

    Ok(lines)
}

/// A quantity is only valid as a whole number greater than zero.
fn positive_quantity(quantity: &serde_json::Number) -> Option<i32> {
    quantity
        .as_i64()
        .filter(|q| *q > 0)
        .and_then(|q| i32::try_from(q).ok())
}

// POST /cart/add
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let quantity = positive_quantity(&req.quantity)
        .ok_or_else(|| AppError::validation("Quantity must be a positive integer"))?;

    let product_id = sqlx::query_scalar::<_, i64>(
        "SELECT serial_number FROM products WHERE serial_number = $1 AND is_visible = TRUE",
    )
    .bind(req.product_id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found or not visible"))?;

    // Get or create the user's cart
    let cart_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO carts (user_id) VALUES ($1)
         ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
         RETURNING id",
    )
    .bind(auth.user_id)
    .fetch_one(&state.db_pool)
    .await?;

    // One row per (cart, product); repeat adds bump the quantity
    sqlx::query(
        "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
         ON CONFLICT (cart_id, product_id)
         DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .execute(&state.db_pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Product added to cart" })),
    ))
}

// GET /cart
pub async fn view_cart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<CartResponse>, AppError> {
    let cart_id = sqlx::query_scalar::<_, i64>("SELECT id FROM carts WHERE user_id = $1")
        .bind(auth.user_id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Cart is empty"))?;

    let lines = load_cart_lines(&state.db_pool, auth.user_id).await?;
    if lines.is_empty() {
        return Err(AppError::not_found("Cart is empty"));
    }

    Ok(Json(CartResponse {
        id: cart_id,
        user: auth.user_id,
        items: lines.into_iter().map(CartItemResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Number;

    #[test]
    fn whole_positive_quantities_are_accepted() {
        assert_eq!(positive_quantity(&Number::from(1)), Some(1));
        assert_eq!(positive_quantity(&Number::from(5)), Some(5));
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        assert_eq!(positive_quantity(&Number::from(0)), None);
        assert_eq!(positive_quantity(&Number::from(-3)), None);
    }

    #[test]
    fn fractional_quantities_are_rejected() {
        let fractional = Number::from_f64(2.5).unwrap();
        assert_eq!(positive_quantity(&fractional), None);
    }

    #[test]
    fn quantities_beyond_i32_are_rejected() {
        assert_eq!(positive_quantity(&Number::from(i64::from(i32::MAX) + 1)), None);
    }
}
