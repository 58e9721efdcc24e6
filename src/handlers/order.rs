use axum::{extract::State, Extension, Json};
use axum::http::StatusCode;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::dtos::order::{OrderLineResponse, OrderResponse, PlaceOrderRequest, PlaceOrderResponse};
use crate::error::AppError;
use crate::fulfillment::{AddOn, OrderPayload, ShippingAddress, ORDER_CREATED_MESSAGE};
use crate::fulfillment::payload::{build_line_items, format_money};
use crate::handlers::cart::load_cart_lines;
use crate::middleware::auth::AuthContext;
use crate::models::order::Order;
use crate::state::AppState;

// POST /orders/place
pub async fn place_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), AppError> {
    // One placement at a time per user; two concurrent submissions must not
    // both reach the provider with the same cart.
    let lock = state.placement_lock(auth.user_id);
    let _guard = lock.lock().await;

    let lines = load_cart_lines(&state.db_pool, auth.user_id).await?;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let (line_items, total_order_value) = build_line_items(&lines);
    let order_number = new_order_number();

    let payload = OrderPayload {
        order_number: order_number.clone(),
        qikink_shipping: "1".to_string(),
        gateway: req.gateway.clone().unwrap_or_else(|| "COD".to_string()),
        total_order_value: format_money(total_order_value),
        line_items,
        add_ons: vec![AddOn::default()],
        shipping_address: ShippingAddress {
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone().unwrap_or_default(),
            address1: req.address1.clone(),
            phone: req.phone.clone(),
            email: req.email.clone(),
            city: req.city.clone(),
            zip: req.zip.clone(),
            province: req.province.clone(),
            country_code: req.country_code.clone(),
        },
    };

    // Recorded before the provider call, so a crash mid-flight leaves a
    // reconciliable pending row instead of a provider order with no local
    // trace.
    let order_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO orders (user_id, order_number, total_order_value, status)
         VALUES ($1, $2, $3, 'pending')
         RETURNING id",
    )
    .bind(auth.user_id)
    .bind(&order_number)
    .bind(total_order_value)
    .fetch_one(&state.db_pool)
    .await?;

    if let Err(e) = state.fulfillment.access_token().await {
        error!(error = %e, %order_number, "Failed to retrieve access token");
        mark_order_failed(&state.db_pool, order_id).await;
        return Err(AppError::upstream("Failed to retrieve access token"));
    }

    info!(%order_number, total = total_order_value, "Submitting order to fulfillment provider");

    let response = match state.fulfillment.submit_order(&payload).await {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, %order_number, payload = ?payload, "Failed to place order");
            mark_order_failed(&state.db_pool, order_id).await;
            return Err(AppError::upstream(e.to_string()));
        }
    };

    if !order_created(&response) {
        error!(%order_number, response = %response, "Order placement rejected by provider");
        mark_order_failed(&state.db_pool, order_id).await;
        return Err(AppError::FulfillmentRejected(response));
    }

    let tracking_url = response
        .get("tracking_url")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    // Commit: order goes live, items are snapshotted, the cart clears - one
    // transaction, all or nothing.
    let commit = async {
        let mut tx = state.db_pool.begin().await?;

        sqlx::query("UPDATE orders SET status = 'committed', tracking_url = $2 WHERE id = $1")
            .bind(order_id)
            .bind(&tracking_url)
            .execute(&mut *tx)
            .await?;

        for line in &lines {
            sqlx::query("INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3)")
                .bind(order_id)
                .bind(line.serial_number)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "DELETE FROM cart_items
             WHERE cart_id = (SELECT id FROM carts WHERE user_id = $1)",
        )
        .bind(auth.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    };

    if let Err(e) = commit.await {
        // The provider has already accepted this order; keep everything
        // needed for manual reconciliation in the log.
        error!(
            error = %e,
            %order_number,
            payload = ?payload,
            response = %response,
            "Order accepted by provider but local commit failed"
        );
        return Err(AppError::db(e));
    }

    info!(%order_number, ?tracking_url, "Order placed");

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            message: "Order placed successfully",
            tracking_url,
        }),
    ))
}

// GET /orders/history
pub async fn order_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT id, user_id, order_number,
                total_order_value::FLOAT8 AS total_order_value,
                tracking_url, status, created_at
         FROM orders
         WHERE user_id = $1 AND status = 'committed'
         ORDER BY created_at DESC, id DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db_pool)
    .await?;

    let mut response = Vec::with_capacity(orders.len());
    for order in orders {
        let items = order_lines(&state.db_pool, order.id).await?;
        response.push(OrderResponse::from_parts(order, items));
    }

    Ok(Json(response))
}

async fn order_lines(db_pool: &PgPool, order_id: i64) -> Result<Vec<OrderLineResponse>, AppError> {
    let rows = sqlx::query_as::<_, (String, i32)>(
        "SELECT p.name, oi.quantity
         FROM order_items oi
         JOIN products p ON oi.product_id = p.serial_number
         WHERE oi.order_id = $1
         ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(db_pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(product_name, quantity)| OrderLineResponse { product_name, quantity })
        .collect())
}

/// Unique per placement; the orders table enforces uniqueness, a v4 UUID
/// guarantees it without coordination.
fn new_order_number() -> String {
    Uuid::new_v4().to_string()
}

fn order_created(response: &serde_json::Value) -> bool {
    response.get("message").and_then(|v| v.as_str()) == Some(ORDER_CREATED_MESSAGE)
}

async fn mark_order_failed(db_pool: &PgPool, order_id: i64) {
    if let Err(e) = sqlx::query("UPDATE orders SET status = 'failed' WHERE id = $1")
        .bind(order_id)
        .execute(db_pool)
        .await
    {
        error!(error = %e, order_id, "Failed to mark order as failed");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    #[test]
    fn order_numbers_are_unique_and_fit_the_column() {
        let numbers: HashSet<String> = (0..1000).map(|_| new_order_number()).collect();
        assert_eq!(numbers.len(), 1000);
        assert!(numbers.iter().all(|n| n.len() <= 50));
    }

    #[test]
    fn provider_success_message_is_recognized() {
        let body = json!({ "message": "Order created successfully", "tracking_url": "https://t.example/1" });
        assert!(order_created(&body));
    }

    #[test]
    fn other_provider_responses_are_rejections() {
        assert!(!order_created(&json!({ "message": "SKU not found" })));
        assert!(!order_created(&json!({ "error": "bad request" })));
        assert!(!order_created(&json!({})));
        assert!(!order_created(&json!({ "message": 42 })));
    }
}
