use serde::{Deserialize, Serialize};

use crate::models::cart::CartLine;

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: i64,
    /// Kept as a raw JSON number so fractional quantities fail validation,
    /// not deserialization.
    pub quantity: serde_json::Number,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub id: i64,
    pub user: i64,
    pub items: Vec<CartItemResponse>,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product: CartProductResponse,
    pub quantity: i32,
    pub line_total: f64,
}

#[derive(Serialize)]
pub struct CartProductResponse {
    pub serial_number: i64,
    pub name: String,
    pub price_with_shipping: f64,
    pub sizes: Option<String>,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        let line_total = line.line_total();
        Self {
            product: CartProductResponse {
                serial_number: line.serial_number,
                name: line.name,
                price_with_shipping: line.unit_price,
                sizes: line.sizes,
            },
            quantity: line.quantity,
            line_total,
        }
    }
}
