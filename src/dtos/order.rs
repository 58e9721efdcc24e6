use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::order::Order;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub first_name: String,
    pub last_name: Option<String>,
    pub address1: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub zip: String,
    pub province: String,
    pub country_code: String,
    /// "COD" unless the client asks for "PREPAID".
    pub gateway: Option<String>,
}

#[derive(Serialize)]
pub struct PlaceOrderResponse {
    pub message: &'static str,
    pub tracking_url: Option<String>,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub order_number: String,
    pub total_order_value: f64,
    pub tracking_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineResponse>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_name: String,
    pub quantity: i32,
}

impl OrderResponse {
    pub fn from_parts(order: Order, items: Vec<OrderLineResponse>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            total_order_value: order.total_order_value,
            tracking_url: order.tracking_url,
            created_at: order.created_at,
            items,
        }
    }
}
